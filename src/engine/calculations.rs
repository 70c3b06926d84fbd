//! Pure numeric routines behind the native process functions.
//!
//! Everything here works on plain row-major `&[f64]` slices so it can be
//! tested without fields, settings or an engine.

/// Relative threshold (in row-difference RMS units) above which a row segment is a scar.
const SCAR_THRESHOLD: f64 = 0.666;

/// Shortest run of pixels counted as a scar.
const SCAR_MIN_LEN: usize = 16;

/// Least-squares plane `z = a + bx·col + by·row` over the full grid.
///
/// Returns `(a, bx, by)` in pixel coordinates.
pub fn fit_plane(data: &[f64], xres: usize, yres: usize) -> (f64, f64, f64) {
    let n = (xres * yres) as f64;
    let xc = (xres as f64 - 1.0) / 2.0;
    let yc = (yres as f64 - 1.0) / 2.0;

    let mut sum = 0.0;
    let mut sum_xz = 0.0;
    let mut sum_yz = 0.0;
    for (i, &z) in data.iter().enumerate() {
        let dx = (i % xres) as f64 - xc;
        let dy = (i / xres) as f64 - yc;
        sum += z;
        sum_xz += dx * z;
        sum_yz += dy * z;
    }

    // On a full regular grid the centred coordinates are orthogonal,
    // so each slope is an independent 1-D regression.
    let sxx: f64 = (0..xres).map(|c| (c as f64 - xc).powi(2)).sum::<f64>() * yres as f64;
    let syy: f64 = (0..yres).map(|r| (r as f64 - yc).powi(2)).sum::<f64>() * xres as f64;
    let bx = if sxx > 0.0 { sum_xz / sxx } else { 0.0 };
    let by = if syy > 0.0 { sum_yz / syy } else { 0.0 };
    let a = sum / n - bx * xc - by * yc;
    (a, bx, by)
}

/// Median of a sample set. Reorders `values`. `0.0` for an empty slice.
pub fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mid = values.len() / 2;
    let (_, m, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    *m
}

/// Legendre polynomials `P_0(x) ..= P_n(x)`.
pub fn legendre(n: usize, x: f64) -> Vec<f64> {
    let mut p = Vec::with_capacity(n + 1);
    p.push(1.0);
    if n >= 1 {
        p.push(x);
    }
    for k in 2..=n {
        let k_f = k as f64;
        let next = ((2.0 * k_f - 1.0) * x * p[k - 1] - (k_f - 1.0) * p[k - 2]) / k_f;
        p.push(next);
    }
    p
}

/// Map pixel index `i` of `res` onto `[-1, 1]`.
fn unit_coordinate(i: usize, res: usize) -> f64 {
    if res <= 1 {
        0.0
    } else {
        2.0 * i as f64 / (res - 1) as f64 - 1.0
    }
}

/// Solve `a·x = b` for a dense `n×n` row-major matrix.
///
/// Gaussian elimination with partial pivoting; `None` when singular.
pub fn solve_linear(mut a: Vec<f64>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    debug_assert_eq!(a.len(), n * n);

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i * n + col].abs().total_cmp(&a[j * n + col].abs()))?;
        if a[pivot * n + col].abs() < 1e-300 {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap(pivot * n + k, col * n + k);
            }
            b.swap(pivot, col);
        }
        for row in col + 1..n {
            let factor = a[row * n + col] / a[col * n + col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row * n + k] -= factor * a[col * n + k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row * n + k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row * n + row];
    }
    Some(x)
}

/// Least-squares polynomial background with independent column/row degrees.
///
/// Fits `Σ a_ij P_i(x) P_j(y)` for `i ≤ col_degree`, `j ≤ row_degree` with
/// Legendre polynomials on coordinates scaled to `[-1, 1]`. Because the basis
/// is separable on a full grid, the normal matrix is the Kronecker product of
/// two small per-axis Gram matrices. Degrees above `res - 1` are reduced so
/// the system stays regular.
///
/// Returns the background value for every sample, or `None` if the fit fails.
pub fn poly_background(
    data: &[f64],
    xres: usize,
    yres: usize,
    col_degree: usize,
    row_degree: usize,
) -> Option<Vec<f64>> {
    let cd = col_degree.min(xres - 1);
    let rd = row_degree.min(yres - 1);
    let (nx, ny) = (cd + 1, rd + 1);

    let px: Vec<Vec<f64>> = (0..xres).map(|c| legendre(cd, unit_coordinate(c, xres))).collect();
    let qy: Vec<Vec<f64>> = (0..yres).map(|r| legendre(rd, unit_coordinate(r, yres))).collect();

    let gram = |basis: &[Vec<f64>], n: usize| -> Vec<f64> {
        let mut g = vec![0.0; n * n];
        for values in basis {
            for i in 0..n {
                for k in 0..n {
                    g[i * n + k] += values[i] * values[k];
                }
            }
        }
        g
    };
    let gx = gram(&px, nx);
    let gy = gram(&qy, ny);

    // t[j][c] = Σ_r Q_j(y_r) z(r, c)
    let mut t = vec![0.0; ny * xres];
    for (r, q) in qy.iter().enumerate() {
        let row = &data[r * xres..(r + 1) * xres];
        for j in 0..ny {
            for (c, &z) in row.iter().enumerate() {
                t[j * xres + c] += q[j] * z;
            }
        }
    }
    // rhs[(i, j)] = Σ_c P_i(x_c) t[j][c]
    let k = nx * ny;
    let mut rhs = vec![0.0; k];
    for i in 0..nx {
        for j in 0..ny {
            rhs[i * ny + j] = (0..xres).map(|c| px[c][i] * t[j * xres + c]).sum();
        }
    }
    let mut normal = vec![0.0; k * k];
    for i in 0..nx {
        for j in 0..ny {
            for p in 0..nx {
                for q in 0..ny {
                    normal[(i * ny + j) * k + p * ny + q] = gx[i * nx + p] * gy[j * ny + q];
                }
            }
        }
    }

    let coeffs = solve_linear(normal, rhs)?;

    let mut background = Vec::with_capacity(xres * yres);
    for q in &qy {
        let u: Vec<f64> = (0..nx)
            .map(|i| (0..ny).map(|j| coeffs[i * ny + j] * q[j]).sum())
            .collect();
        for p in &px {
            background.push((0..nx).map(|i| u[i] * p[i]).sum::<f64>());
        }
    }
    Some(background)
}

/// Box-filter `data` with a `size × size` window clamped at the edges.
///
/// For even sizes the window extends one pixel further right/down.
pub fn mean_filter(data: &[f64], xres: usize, yres: usize, size: usize) -> Vec<f64> {
    let before = (size - 1) / 2;
    let after = size / 2;

    // Summed-area table with a zero border row/column
    let w = xres + 1;
    let mut sat = vec![0.0; w * (yres + 1)];
    for r in 0..yres {
        let mut row_sum = 0.0;
        for c in 0..xres {
            row_sum += data[r * xres + c];
            sat[(r + 1) * w + c + 1] = sat[r * w + c + 1] + row_sum;
        }
    }

    let mut out = Vec::with_capacity(data.len());
    for r in 0..yres {
        let r0 = r.saturating_sub(before);
        let r1 = (r + after).min(yres - 1) + 1;
        for c in 0..xres {
            let c0 = c.saturating_sub(before);
            let c1 = (c + after).min(xres - 1) + 1;
            let total = sat[r1 * w + c1] - sat[r0 * w + c1] - sat[r1 * w + c0] + sat[r0 * w + c0];
            out.push(total / ((r1 - r0) * (c1 - c0)) as f64);
        }
    }
    out
}

/// Mark single-row scars: horizontal runs that stick out above (or below)
/// both neighbouring rows by more than the threshold.
pub fn find_scars(data: &[f64], xres: usize, yres: usize) -> Vec<bool> {
    let mut mask = vec![false; data.len()];
    if yres < 3 {
        return mask;
    }

    let diffs = (xres * (yres - 1)) as f64;
    let rms = (xres..data.len())
        .map(|i| (data[i] - data[i - xres]).powi(2))
        .sum::<f64>()
        / diffs;
    let threshold = SCAR_THRESHOLD * rms.sqrt();
    if threshold <= 0.0 {
        return mask;
    }
    let min_len = SCAR_MIN_LEN.min(xres);

    for r in 1..yres - 1 {
        // +1 for a ridge, -1 for a trench, 0 otherwise
        let sign = |c: usize| -> i8 {
            let z = data[r * xres + c];
            let up = z - data[(r - 1) * xres + c];
            let down = z - data[(r + 1) * xres + c];
            if up.min(down) > threshold {
                1
            } else if up.max(down) < -threshold {
                -1
            } else {
                0
            }
        };

        let mut c = 0;
        while c < xres {
            let s = sign(c);
            if s == 0 {
                c += 1;
                continue;
            }
            let start = c;
            while c < xres && sign(c) == s {
                c += 1;
            }
            if c - start >= min_len {
                mask[r * xres + start..r * xres + c].fill(true);
            }
        }
    }
    mask
}
