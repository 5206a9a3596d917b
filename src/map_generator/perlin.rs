//! Ken Perlin's improved 3D noise with octave stacking. The pipeline samples
//! it at hex world positions with the per-stage seed as the z coordinate, so
//! one permutation table serves every stage deterministically.

/// Ken Perlin's reference permutation table.
const PERMUTATION: [u8; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209,
    76, 132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198,
    173, 186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212,
    207, 206, 59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44,
    154, 163, 70, 221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79,
    113, 224, 232, 178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12,
    191, 179, 162, 241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157,
    184, 84, 204, 176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29,
    24, 72, 243, 141, 128, 195, 78, 66, 215, 61, 156, 180,
];

#[inline]
fn perm(index: usize) -> usize {
    PERMUTATION[index & 255] as usize
}

#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    // Pick one of 12 gradient directions from the low hash bits.
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    let u = if h & 1 == 0 { u } else { -u };
    let v = if h & 2 == 0 { v } else { -v };
    u + v
}

/// Single-octave improved noise, in about [-1, 1].
pub fn noise(x: f64, y: f64, z: f64) -> f64 {
    let xi = x.floor() as i64 as usize;
    let yi = y.floor() as i64 as usize;
    let zi = z.floor() as i64 as usize;
    let xf = x - x.floor();
    let yf = y - y.floor();
    let zf = z - z.floor();

    let u = fade(xf);
    let v = fade(yf);
    let w = fade(zf);

    let a = perm(xi) + (yi & 255);
    let aa = perm(a) + (zi & 255);
    let ab = perm(a + 1) + (zi & 255);
    let b = perm(xi + 1) + (yi & 255);
    let ba = perm(b) + (zi & 255);
    let bb = perm(b + 1) + (zi & 255);

    lerp(
        w,
        lerp(
            v,
            lerp(
                u,
                grad(perm(aa), xf, yf, zf),
                grad(perm(ba), xf - 1.0, yf, zf),
            ),
            lerp(
                u,
                grad(perm(ab), xf, yf - 1.0, zf),
                grad(perm(bb), xf - 1.0, yf - 1.0, zf),
            ),
        ),
        lerp(
            v,
            lerp(
                u,
                grad(perm(aa + 1), xf, yf, zf - 1.0),
                grad(perm(ba + 1), xf - 1.0, yf, zf - 1.0),
            ),
            lerp(
                u,
                grad(perm(ab + 1), xf, yf - 1.0, zf - 1.0),
                grad(perm(bb + 1), xf - 1.0, yf - 1.0, zf - 1.0),
            ),
        ),
    )
}

/// Layered octaves, normalized back to about [-1, 1].
pub fn noise3d(
    x: f64,
    y: f64,
    z: f64,
    n_octaves: u32,
    persistence: f64,
    lacunarity: f64,
    scale: f64,
) -> f64 {
    let mut frequency = 1.0;
    let mut amplitude = 1.0;
    let mut total = 0.0;
    let mut max_amplitude = 0.0;
    for _ in 0..n_octaves {
        total += noise(
            x * frequency / scale,
            y * frequency / scale,
            z * frequency / scale,
        ) * amplitude;
        max_amplitude += amplitude;
        frequency *= lacunarity;
        amplitude *= persistence;
    }
    total / max_amplitude
}

/// Ridged variant: each octave is folded (`1 - |noise|`) so values pile up
/// along sharp crests. Still about [-1, 1].
pub fn ridged_noise3d(
    x: f64,
    y: f64,
    z: f64,
    n_octaves: u32,
    persistence: f64,
    lacunarity: f64,
    scale: f64,
) -> f64 {
    let mut frequency = 1.0;
    let mut amplitude = 1.0;
    let mut total = 0.0;
    let mut max_amplitude = 0.0;
    for _ in 0..n_octaves {
        let folded = 1.0
            - noise(
                x * frequency / scale,
                y * frequency / scale,
                z * frequency / scale,
            )
            .abs();
        total += (folded * 2.0 - 1.0) * amplitude;
        max_amplitude += amplitude;
        frequency *= lacunarity;
        amplitude *= persistence;
    }
    total / max_amplitude
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_is_deterministic() {
        assert_eq!(noise(1.5, 2.5, 3.5), noise(1.5, 2.5, 3.5));
        assert_eq!(
            noise3d(1.5, 2.5, 42.0, 6, 0.5, 2.0, 10.0),
            noise3d(1.5, 2.5, 42.0, 6, 0.5, 2.0, 10.0)
        );
    }

    #[test]
    fn octave_noise_stays_in_range() {
        for i in 0..200 {
            let x = i as f64 * 0.73;
            let y = i as f64 * 1.31;
            let value = noise3d(x, y, 17.0, 6, 0.5, 2.0, 10.0);
            assert!((-1.0..=1.0).contains(&value), "noise3d({x}, {y}) = {value}");
            let ridged = ridged_noise3d(x, y, 17.0, 6, 0.5, 2.0, 10.0);
            assert!((-1.0..=1.0).contains(&ridged));
        }
    }

    #[test]
    fn different_seeds_decorrelate() {
        let a: f64 = (0..100)
            .map(|i| noise3d(i as f64, i as f64 * 0.5, 1.0, 6, 0.5, 2.0, 10.0))
            .sum();
        let b: f64 = (0..100)
            .map(|i| noise3d(i as f64, i as f64 * 0.5, 2.0, 6, 0.5, 2.0, 10.0))
            .sum();
        assert_ne!(a, b);
    }
}
