//! Word-parallel AND kernels over lane slices.
//!
//! Each operation has an AVX2 path selected at runtime and a portable scalar
//! fallback. Both return whether any word survived the AND, which the search
//! loop uses for early termination. The fold kernel skips lanes whose
//! destination is already zero; on a drained working bitmap that makes
//! further folds near free.

use crate::buffer::Lane;

/// `dst &= src` lanewise. Returns `true` if any word of `dst` is nonzero
/// afterwards.
///
/// Panics if the slices differ in length.
pub fn and_assign(dst: &mut [Lane], src: &[Lane]) -> bool {
    assert_eq!(dst.len(), src.len(), "lane count mismatch");

    #[cfg(target_arch = "x86_64")]
    if std::arch::is_x86_feature_detected!("avx2") {
        return unsafe { and_assign_avx2(dst, src) };
    }

    and_assign_scalar(dst, src)
}

/// `dst = a & b` lanewise. Returns `true` if any word of `dst` is nonzero
/// afterwards.
///
/// Panics if the slices differ in length.
pub fn and_into(dst: &mut [Lane], a: &[Lane], b: &[Lane]) -> bool {
    assert_eq!(dst.len(), a.len(), "lane count mismatch");
    assert_eq!(dst.len(), b.len(), "lane count mismatch");

    #[cfg(target_arch = "x86_64")]
    if std::arch::is_x86_feature_detected!("avx2") {
        return unsafe { and_into_avx2(dst, a, b) };
    }

    and_into_scalar(dst, a, b)
}

fn and_assign_scalar(dst: &mut [Lane], src: &[Lane]) -> bool {
    let mut survivors = 0u64;
    for (d, s) in dst.iter_mut().zip(src) {
        for k in 0..crate::buffer::LANE_WORDS {
            let w = d.0[k];
            if w == 0 {
                continue;
            }
            let r = w & s.0[k];
            d.0[k] = r;
            survivors |= r;
        }
    }
    survivors != 0
}

fn and_into_scalar(dst: &mut [Lane], a: &[Lane], b: &[Lane]) -> bool {
    let mut survivors = 0u64;
    for (d, (x, y)) in dst.iter_mut().zip(a.iter().zip(b)) {
        for k in 0..crate::buffer::LANE_WORDS {
            let r = x.0[k] & y.0[k];
            d.0[k] = r;
            survivors |= r;
        }
    }
    survivors != 0
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn and_assign_avx2(dst: &mut [Lane], src: &[Lane]) -> bool {
    use std::arch::x86_64::*;

    let mut survivors = _mm256_setzero_si256();
    for (d, s) in dst.iter_mut().zip(src) {
        let dp = (d as *mut Lane).cast::<__m256i>();
        let dv = _mm256_load_si256(dp);
        // Skip lanes that are already drained.
        if _mm256_testz_si256(dv, dv) != 0 {
            continue;
        }
        let sv = _mm256_load_si256((s as *const Lane).cast::<__m256i>());
        let rv = _mm256_and_si256(dv, sv);
        _mm256_store_si256(dp, rv);
        survivors = _mm256_or_si256(survivors, rv);
    }
    _mm256_testz_si256(survivors, survivors) == 0
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn and_into_avx2(dst: &mut [Lane], a: &[Lane], b: &[Lane]) -> bool {
    use std::arch::x86_64::*;

    let mut survivors = _mm256_setzero_si256();
    for (d, (x, y)) in dst.iter_mut().zip(a.iter().zip(b)) {
        let xv = _mm256_load_si256((x as *const Lane).cast::<__m256i>());
        let yv = _mm256_load_si256((y as *const Lane).cast::<__m256i>());
        let rv = _mm256_and_si256(xv, yv);
        _mm256_store_si256((d as *mut Lane).cast::<__m256i>(), rv);
        survivors = _mm256_or_si256(survivors, rv);
    }
    _mm256_testz_si256(survivors, survivors) == 0
}
