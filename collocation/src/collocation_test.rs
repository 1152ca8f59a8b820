#[cfg(test)]
mod tests {
    use crate::basis::{collocate_basis, orbitals, BasisSet};
    use crate::dispatch::{dispatch_table, KernelId, KernelPolicy};
    use crate::driver::{collocate, collocate_arrays, CollocationOptions};
    use crate::error::CollocationError;
    use crate::kernels::specialized::SPECIALIZED_MAX_L;
    use crate::order::{CartesianOrder, SphericalOrder, OUTPUT_LABELS};
    use crate::output::{Layout, OutputArrays, OutputBuffers};
    use crate::shell::{Primitive, Shell, ShellKind};
    use crate::solid_harmonics::cartesian_to_spherical;
    use nalgebra::{DMatrix, Vector3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::Normal;

    fn random_points(n: usize, sigma: f64, seed: u64) -> Vec<Vector3<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, sigma).unwrap();
        (0..n)
            .map(|_| Vector3::new(rng.sample(normal), rng.sample(normal), rng.sample(normal)))
            .collect()
    }

    /// Random points plus the shell centre, a point on an axis and two far away.
    fn test_points(center: &Vector3<f64>, seed: u64) -> Vec<Vector3<f64>> {
        let mut points = random_points(90, 1.2, seed);
        points.push(*center);
        points.push(center + Vector3::new(0.0, 0.0, 0.5));
        points.push(Vector3::new(12.0, -9.0, 7.5));
        points.push(Vector3::new(-40.0, 35.0, 20.0));
        points
    }

    fn contracted(l: i32, kind: ShellKind) -> Shell {
        Shell::from_exponents(
            l,
            &[3.1, 0.9, 0.27],
            &[0.25, 0.55, 0.4],
            Vector3::new(0.15, -0.3, 0.2),
            kind,
        )
        .unwrap()
    }

    fn max_abs(values: &[f64]) -> f64 {
        values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
    }

    #[test]
    fn test_specialized_matches_generic() {
        // the specialised ceiling and one past it
        for l in 0..=(SPECIALIZED_MAX_L as i32 + 1) {
            let shell = contracted(l, ShellKind::Cartesian);
            let points = test_points(shell.center(), 11 + l as u64);
            for order in 0..=3 {
                let fast = collocate_arrays(
                    &shell,
                    &points,
                    order,
                    Layout::ComponentMajor,
                    &CollocationOptions::default(),
                )
                .unwrap();
                let reference = collocate_arrays(
                    &shell,
                    &points,
                    order,
                    Layout::ComponentMajor,
                    &CollocationOptions::default().generic_only(),
                )
                .unwrap();

                for (o, (f, g)) in fast.arrays.iter().zip(&reference.arrays).enumerate() {
                    let scale = 1.0 + max_abs(g);
                    for (idx, (a, b)) in f.iter().zip(g).enumerate() {
                        assert!(
                            (a - b).abs() <= 1e-10 * scale,
                            "L = {l}, order = {order}, {}[{idx}]: {a} vs {b}",
                            OUTPUT_LABELS[o]
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_dispatch_boundary() {
        let table = dispatch_table();
        let at = table
            .select(SPECIALIZED_MAX_L, 3, ShellKind::Cartesian, KernelPolicy::Auto)
            .unwrap();
        assert!(matches!(at.id(), KernelId::Specialized { .. }));
        let past = table
            .select(SPECIALIZED_MAX_L + 1, 0, ShellKind::Cartesian, KernelPolicy::Auto)
            .unwrap();
        assert_eq!(past.id(), KernelId::Generic);
    }

    fn at_point(shell: &Shell, point: Vector3<f64>, order: usize) -> OutputArrays {
        collocate_arrays(
            shell,
            &[point],
            order,
            Layout::ComponentMajor,
            &CollocationOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_first_derivatives_by_finite_difference() {
        let h = 1e-5;
        let axes = [Vector3::x(), Vector3::y(), Vector3::z()];
        for l in 0..=10 {
            for kind in [ShellKind::Cartesian, ShellKind::Spherical] {
                let shell = contracted(l, kind);
                for point in random_points(4, 1.0, 100 + l as u64) {
                    let analytic = at_point(&shell, point, 1);
                    for (axis, dir) in axes.iter().enumerate() {
                        let plus = at_point(&shell, point + dir * h, 0);
                        let minus = at_point(&shell, point - dir * h, 0);
                        let scale = 1.0 + max_abs(&analytic.arrays[axis + 1]);
                        for comp in 0..shell.n_functions() {
                            let numeric = (plus.arrays[0][comp] - minus.arrays[0][comp]) / (2.0 * h);
                            let exact = analytic.arrays[axis + 1][comp];
                            assert!(
                                (numeric - exact).abs() <= 1e-6 * scale,
                                "L = {l} {kind:?} axis {axis} component {comp}: {numeric} vs {exact}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_higher_derivatives_by_finite_difference() {
        let h = 1e-5;
        let shell = contracted(3, ShellKind::Cartesian);
        let axes = [Vector3::x(), Vector3::y(), Vector3::z()];
        for point in random_points(5, 0.8, 7) {
            let analytic = at_point(&shell, point, 3);
            // d/dk of the first derivative along j gives the (j, k) second
            // derivative; d/dk of PHI_XY gives the third derivative (x, y, k)
            let second = [[4, 5, 6], [5, 7, 8], [6, 8, 9]];
            let third_from_xy = [11, 13, 14];
            for (k, dir) in axes.iter().enumerate() {
                let plus = at_point(&shell, point + dir * h, 2);
                let minus = at_point(&shell, point - dir * h, 2);
                for comp in 0..shell.n_functions() {
                    for j in 0..3 {
                        let numeric = (plus.arrays[j + 1][comp] - minus.arrays[j + 1][comp]) / (2.0 * h);
                        let exact = analytic.arrays[second[j][k]][comp];
                        assert!(
                            (numeric - exact).abs() <= 1e-5 * (1.0 + exact.abs()),
                            "second derivative ({j}, {k}) component {comp}: {numeric} vs {exact}"
                        );
                    }
                    let numeric = (plus.arrays[5][comp] - minus.arrays[5][comp]) / (2.0 * h);
                    let exact = analytic.arrays[third_from_xy[k]][comp];
                    assert!(
                        (numeric - exact).abs() <= 1e-5 * (1.0 + exact.abs()),
                        "{} component {comp}: {numeric} vs {exact}",
                        OUTPUT_LABELS[third_from_xy[k]]
                    );
                }
            }
        }
    }

    #[test]
    fn test_spherical_equals_transformed_cartesian() {
        for l in 0..=12 {
            let spherical = contracted(l, ShellKind::Spherical);
            let cartesian = contracted(l, ShellKind::Cartesian);
            let points = test_points(spherical.center(), 40 + l as u64);
            let n = points.len();
            let opts = CollocationOptions::default();

            let sph = collocate_arrays(&spherical, &points, 2, Layout::ComponentMajor, &opts).unwrap();
            let cart = collocate_arrays(&cartesian, &points, 2, Layout::ComponentMajor, &opts).unwrap();

            for o in 0..sph.arrays.len() {
                let mut transformed = vec![0.0; spherical.n_spherical() * n];
                cartesian_to_spherical(l as u32, &cart.arrays[o], n, &mut transformed, SphericalOrder::Gaussian)
                    .unwrap();
                assert_eq!(transformed, sph.arrays[o], "L = {l}, {}", OUTPUT_LABELS[o]);
            }
        }
    }

    #[test]
    fn test_shell_validation() {
        let center = Vector3::zeros();
        assert!(matches!(
            Shell::from_exponents(1, &[0.0], &[1.0], center, ShellKind::Cartesian),
            Err(CollocationError::InvalidBasis(_))
        ));
        assert!(matches!(
            Shell::from_exponents(1, &[-2.0], &[1.0], center, ShellKind::Cartesian),
            Err(CollocationError::InvalidBasis(_))
        ));
        assert!(matches!(
            Shell::new(2, vec![], center, ShellKind::Spherical),
            Err(CollocationError::InvalidBasis(_))
        ));
        assert!(matches!(
            Shell::new(-1, vec![Primitive::new(1.0, 1.0)], center, ShellKind::Cartesian),
            Err(CollocationError::InvalidBasis(_))
        ));

        let s = Shell::new(0, vec![Primitive::new(1.0, 1.0)], center, ShellKind::Cartesian).unwrap();
        assert_eq!(s.n_cartesian(), 1);
        assert_eq!(s.n_spherical(), 1);
    }

    #[test]
    fn test_buffer_one_point_short() {
        let shell = contracted(2, ShellKind::Spherical);
        let points = random_points(10, 1.0, 3);
        let mut short = vec![0.0; 5 * 9];
        let mut buffers = OutputBuffers::new(Layout::ComponentMajor, vec![short.as_mut_slice()]);
        let res = collocate(&shell, &points, 0, &mut buffers, &CollocationOptions::default());
        assert_eq!(
            res,
            Err(CollocationError::BufferSize {
                output: "PHI",
                expected: 50,
                found: 45
            })
        );

        // the second output is the short one
        let mut ok = vec![0.0; 50];
        let mut bad = vec![0.0; 49];
        let mut x = vec![0.0; 50];
        let mut y = vec![0.0; 50];
        let mut buffers = OutputBuffers::new(
            Layout::PointMajor,
            vec![ok.as_mut_slice(), bad.as_mut_slice(), x.as_mut_slice(), y.as_mut_slice()],
        );
        let res = collocate(&shell, &points, 1, &mut buffers, &CollocationOptions::default());
        assert!(matches!(
            res,
            Err(CollocationError::BufferSize { output: "PHI_X", .. })
        ));
    }

    #[test]
    fn test_wrong_buffer_count_and_order() {
        let shell = contracted(1, ShellKind::Cartesian);
        let points = random_points(4, 1.0, 5);
        let mut a = vec![0.0; 12];
        let mut buffers = OutputBuffers::new(Layout::ComponentMajor, vec![a.as_mut_slice()]);
        assert!(matches!(
            collocate(&shell, &points, 1, &mut buffers, &CollocationOptions::default()),
            Err(CollocationError::BufferCount { order: 1, expected: 4, found: 1 })
        ));
        assert_eq!(
            collocate(&shell, &points, 4, &mut buffers, &CollocationOptions::default()),
            Err(CollocationError::UnsupportedDerivativeOrder(4))
        );
    }

    #[test]
    fn test_s_shell_scenarios() {
        let shell = Shell::from_exponents(0, &[1.0], &[1.0], Vector3::zeros(), ShellKind::Cartesian)
            .unwrap();
        let points = [Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0)];
        let arrays = collocate_arrays(
            &shell,
            &points,
            0,
            Layout::ComponentMajor,
            &CollocationOptions::default(),
        )
        .unwrap();
        let phi = arrays.get("PHI").unwrap();
        assert_eq!(phi[0], 1.0);
        assert!((phi[1] - 0.367879441171442).abs() < 1e-14, "got {}", phi[1]);
    }

    #[test]
    fn test_p_shell_scenario() {
        let shell = Shell::from_exponents(1, &[1.0], &[1.0], Vector3::zeros(), ShellKind::Cartesian)
            .unwrap();
        let arrays = at_point(&shell, Vector3::new(1.0, 0.0, 0.0), 0);
        let phi = arrays.get("PHI").unwrap();
        assert!((phi[0] - (-1.0f64).exp()).abs() < 1e-15);
        assert_eq!(phi[1], 0.0);
        assert_eq!(phi[2], 0.0);
    }

    #[test]
    fn test_empty_batch() {
        for kind in [ShellKind::Cartesian, ShellKind::Spherical] {
            let shell = contracted(3, kind);
            let mut buf = vec![-3.0; 8];
            let mut buffers = OutputBuffers::new(Layout::PointMajor, vec![buf.as_mut_slice()]);
            collocate(&shell, &[], 0, &mut buffers, &CollocationOptions::default()).unwrap();
            assert!(buf.iter().all(|&v| v == -3.0));
        }
    }

    #[test]
    fn test_molden_order_is_permutation() {
        let shell = contracted(2, ShellKind::Cartesian);
        let points = random_points(17, 1.0, 9);
        let row = collocate_arrays(&shell, &points, 1, Layout::ComponentMajor, &CollocationOptions::default())
            .unwrap();
        let opts = CollocationOptions {
            cartesian_order: CartesianOrder::Molden,
            ..Default::default()
        };
        let molden = collocate_arrays(&shell, &points, 1, Layout::ComponentMajor, &opts).unwrap();

        // xx yy zz xy xz yz  ->  row positions
        let source = [0, 3, 5, 1, 2, 4];
        for o in 0..4 {
            for (dst, &src) in source.iter().enumerate() {
                for p in 0..points.len() {
                    assert_eq!(molden.value(o, dst, p), row.value(o, src, p));
                }
            }
        }

        let h = contracted(5, ShellKind::Cartesian);
        assert_eq!(
            collocate_arrays(&h, &points, 0, Layout::ComponentMajor, &opts).unwrap_err(),
            CollocationError::UnsupportedOrdering { ordering: "molden", l: 5 }
        );
        // spherical shells ignore the Cartesian order
        let sph = contracted(5, ShellKind::Spherical);
        assert!(collocate_arrays(&sph, &points, 0, Layout::ComponentMajor, &opts).is_ok());
    }

    #[test]
    fn test_cca_order_is_permutation() {
        let shell = contracted(2, ShellKind::Spherical);
        let points = random_points(9, 1.0, 21);
        let gaussian = collocate_arrays(&shell, &points, 0, Layout::PointMajor, &CollocationOptions::default())
            .unwrap();
        let opts = CollocationOptions {
            spherical_order: SphericalOrder::Cca,
            ..Default::default()
        };
        let cca = collocate_arrays(&shell, &points, 0, Layout::PointMajor, &opts).unwrap();

        // m = -2, -1, 0, 1, 2 read from Gaussian slots 4, 2, 0, 1, 3
        let source = [4, 2, 0, 1, 3];
        for (dst, &src) in source.iter().enumerate() {
            for p in 0..points.len() {
                assert_eq!(cca.value(0, dst, p), gaussian.value(0, src, p));
            }
        }
    }

    #[test]
    fn test_layouts_agree() {
        let shell = contracted(4, ShellKind::Spherical);
        let points = random_points(75, 1.0, 31);
        let opts = CollocationOptions::default();
        let cm = collocate_arrays(&shell, &points, 3, Layout::ComponentMajor, &opts).unwrap();
        let pm = collocate_arrays(&shell, &points, 3, Layout::PointMajor, &opts).unwrap();
        for o in 0..20 {
            for c in 0..9 {
                for p in 0..points.len() {
                    assert_eq!(cm.value(o, c, p), pm.value(o, c, p));
                }
            }
        }
    }

    #[test]
    fn test_strided_padding_untouched() {
        const PAD: f64 = 12345.0;
        let shell = contracted(2, ShellKind::Cartesian);
        let points = random_points(70, 1.0, 13);
        let (ncomp, npts) = (6, points.len());
        let opts = CollocationOptions::default().with_block_size(16);

        // component-major, 3 padding values per row
        let tight = collocate_arrays(&shell, &points, 1, Layout::ComponentMajor, &opts).unwrap();
        let stride = npts + 3;
        let mut storage = vec![vec![PAD; ncomp * stride]; 4];
        {
            let mut buffers = OutputBuffers::new(
                Layout::ComponentMajor,
                storage.iter_mut().map(|b| b.as_mut_slice()).collect(),
            )
            .with_stride(stride);
            collocate(&shell, &points, 1, &mut buffers, &opts).unwrap();
        }
        for (o, buf) in storage.iter().enumerate() {
            for c in 0..ncomp {
                assert_eq!(&buf[c * stride..c * stride + npts], &tight.arrays[o][c * npts..(c + 1) * npts]);
                assert!(buf[c * stride + npts..(c + 1) * stride].iter().all(|&v| v == PAD));
            }
        }

        // point-major, 2 padding values per row
        let tight = collocate_arrays(&shell, &points, 1, Layout::PointMajor, &opts).unwrap();
        let stride = ncomp + 2;
        let mut storage = vec![vec![PAD; npts * stride]; 4];
        {
            let mut buffers = OutputBuffers::new(
                Layout::PointMajor,
                storage.iter_mut().map(|b| b.as_mut_slice()).collect(),
            )
            .with_stride(stride);
            collocate(&shell, &points, 1, &mut buffers, &opts).unwrap();
        }
        for (o, buf) in storage.iter().enumerate() {
            for p in 0..npts {
                assert_eq!(&buf[p * stride..p * stride + ncomp], &tight.arrays[o][p * ncomp..(p + 1) * ncomp]);
                assert!(buf[p * stride + ncomp..(p + 1) * stride].iter().all(|&v| v == PAD));
            }
        }
    }

    #[test]
    fn test_parallel_matches_serial() {
        let points = random_points(301, 1.5, 17);
        for (l, kind) in [(1, ShellKind::Cartesian), (6, ShellKind::Spherical), (10, ShellKind::Cartesian)] {
            let shell = contracted(l, kind);
            for layout in [Layout::ComponentMajor, Layout::PointMajor] {
                let serial = collocate_arrays(
                    &shell,
                    &points,
                    2,
                    layout,
                    &CollocationOptions::default().serial(),
                )
                .unwrap();
                for block in [1, 7, 64, 1000] {
                    let opts = CollocationOptions::default().with_block_size(block);
                    let parallel = collocate_arrays(&shell, &points, 2, layout, &opts).unwrap();
                    assert_eq!(parallel, serial, "L = {l}, {layout:?}, block {block}");
                }
            }
        }
    }

    fn mixed_basis() -> BasisSet {
        BasisSet::new(vec![
            Shell::from_exponents(0, &[1.2, 0.3], &[0.6, 0.5], Vector3::new(0.0, 0.0, 0.0), ShellKind::Cartesian)
                .unwrap(),
            contracted(1, ShellKind::Cartesian),
            Shell::from_exponents(2, &[0.8], &[1.0], Vector3::new(1.0, -0.5, 0.3), ShellKind::Spherical)
                .unwrap(),
            contracted(3, ShellKind::Cartesian),
            Shell::from_exponents(9, &[0.5], &[1.0], Vector3::new(-0.4, 0.2, 0.1), ShellKind::Spherical)
                .unwrap(),
        ])
    }

    #[test]
    fn test_basis_matches_per_shell() {
        let basis = mixed_basis();
        let points = random_points(130, 1.3, 23);
        let (ntotal, npts) = (basis.n_functions(), points.len());
        assert_eq!(ntotal, 1 + 3 + 5 + 10 + 19);

        for layout in [Layout::ComponentMajor, Layout::PointMajor] {
            for parallel in [true, false] {
                let opts = CollocationOptions {
                    parallel,
                    ..Default::default()
                };
                let mut whole = OutputArrays::zeros(1, ntotal, npts, layout).unwrap();
                collocate_basis(&basis, &points, 1, &mut whole.buffers(), &opts).unwrap();

                for (shell, offset) in basis.shells().iter().zip(basis.offsets()) {
                    let single = collocate_arrays(shell, &points, 1, layout, &opts).unwrap();
                    for o in 0..4 {
                        for c in 0..shell.n_functions() {
                            for p in 0..npts {
                                assert_eq!(
                                    whole.value(o, offset + c, p),
                                    single.value(o, c, p),
                                    "{layout:?} shell at {offset}, component {c}"
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_point_major_basis_chunks() {
        let basis = mixed_basis();
        let points = random_points(45, 1.1, 31);
        let (ntotal, npts) = (basis.n_functions(), points.len());
        let stride = ntotal + 3;
        let len = (npts - 1) * stride + ntotal + 2;

        let mut reference: Option<Vec<Vec<f64>>> = None;
        for block in [1, 7, 45, 1000] {
            for parallel in [true, false] {
                let opts = CollocationOptions {
                    parallel,
                    block_size: block,
                    ..Default::default()
                };
                let mut bufs = vec![vec![-7.0; len]; 4];
                {
                    let mut buffers = OutputBuffers::new(
                        Layout::PointMajor,
                        bufs.iter_mut().map(|b| b.as_mut_slice()).collect(),
                    )
                    .with_stride(stride);
                    collocate_basis(&basis, &points, 1, &mut buffers, &opts).unwrap();
                }

                for buf in &bufs {
                    for p in 0..npts {
                        let pad_end = if p + 1 == npts { len } else { (p + 1) * stride };
                        assert!(buf[p * stride + ntotal..pad_end].iter().all(|&v| v == -7.0));
                    }
                }
                for (shell, offset) in basis.shells().iter().zip(basis.offsets()) {
                    let single = collocate_arrays(shell, &points, 1, Layout::PointMajor, &opts).unwrap();
                    for (o, buf) in bufs.iter().enumerate() {
                        for p in 0..npts {
                            for c in 0..shell.n_functions() {
                                assert_eq!(buf[p * stride + offset + c], single.value(o, c, p));
                            }
                        }
                    }
                }
                match &reference {
                    Some(r) => assert_eq!(&bufs, r, "block {block}, parallel {parallel}"),
                    None => reference = Some(bufs),
                }
            }
        }
    }

    #[test]
    fn test_orbitals_are_coefficient_products() {
        let basis = mixed_basis();
        let points = random_points(50, 1.0, 29);
        let nbf = basis.n_functions();
        let mut rng = StdRng::seed_from_u64(5);
        let coefficients = DMatrix::from_fn(3, nbf, |_, _| rng.gen_range(-1.0..1.0));

        let values = orbitals(&basis, &coefficients, &points, &CollocationOptions::default()).unwrap();
        assert_eq!(values.shape(), (3, points.len()));

        let mut phi = OutputArrays::zeros(0, nbf, points.len(), Layout::ComponentMajor).unwrap();
        collocate_basis(&basis, &points, 0, &mut phi.buffers(), &CollocationOptions::default()).unwrap();
        for i in 0..3 {
            for p in 0..points.len() {
                let terms: Vec<f64> = (0..nbf).map(|mu| coefficients[(i, mu)] * phi.value(0, mu, p)).collect();
                let expected: f64 = terms.iter().sum();
                let magnitude: f64 = terms.iter().map(|t| t.abs()).sum();
                let got = values[(i, p)];
                assert!(
                    (got - expected).abs() <= 1e-12 * (1.0 + magnitude),
                    "orbital {i} point {p}: {got} vs {expected}"
                );
            }
        }
    }
}
