//! End-to-end properties of the arithmetic layer
//!
//! Exercised over the dealer reference engine with the default FM64 / f=18
//! configuration unless a test says otherwise.

use mantle_hal::{
    add, bitcast, div, equal, exp, idiv, less, log, matmul, mul, rsqrt, select, sign, sub, tanh,
    DataType, ExpMode, Field, RuntimeConfig, SigmoidMode,
};
use mantle_harness::Session;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn assert_close(got: &[f64], want: &[f64], tol: f64) {
    assert_eq!(got.len(), want.len());
    for (g, w) in got.iter().zip(want) {
        assert!((g - w).abs() <= tol, "got {g}, want {w} (tol {tol})");
    }
}

fn assert_rel(got: &[f64], want: &[f64], rel: f64) {
    for (g, w) in got.iter().zip(want) {
        let tol = w.abs() * rel + 1e-4;
        assert!((g - w).abs() <= tol, "got {g}, want {w} (rel {rel})");
    }
}

// =========================================================================
// Section 1: Truncation and encoding invariants
// =========================================================================

mod encoding_tests {
    use super::*;

    #[test]
    fn test_truncation_invariant_random_products() {
        let session = Session::default_with_seed(2024).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let ulp = 2f64.powi(-18);

        for _ in 0..20 {
            let a: f64 = rng.gen_range(-100.0..100.0);
            let b: f64 = rng.gen_range(-100.0..100.0);
            let x = session.share_fxp(&[a]).unwrap();
            let y = session.share_fxp(&[b]).unwrap();
            let got = session.open_fxp(&mul(session.ctx(), &x, &y).unwrap()).unwrap()[0];
            // Encoding floors each operand and the truncation may lose one
            // more ulp, so the product sits within a few ulps of the real
            // value.
            let bound = (a.abs() + b.abs() + 4.0) * ulp;
            assert!(
                (got - a * b).abs() <= bound,
                "{a} * {b}: got {got}, want {}",
                a * b
            );
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let session = Session::default_with_seed(5).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let values: Vec<f64> = (0..64).map(|_| rng.gen_range(-1000.0..1000.0)).collect();
        let x = session.share_fxp(&values).unwrap();
        let back = session.open_fxp(&x).unwrap();
        for (v, b) in values.iter().zip(&back) {
            assert!((v - b).abs() <= 2f64.powi(-18));
        }
    }
}

// =========================================================================
// Section 2: Reveal equivalence
// =========================================================================

mod reveal_equivalence_tests {
    use super::*;

    #[test]
    fn test_integer_expression_exact() {
        let session = Session::default_with_seed(31).unwrap();
        let ctx = session.ctx();
        let a = session.share_int(&[17, -9, 1000], DataType::I64).unwrap();
        let b = session.share_int(&[3, 40, -7], DataType::I64).unwrap();
        let c = session.share_int(&[-2, 5, 11], DataType::I64).unwrap();

        // (a * b + c) - a
        let expr = sub(ctx, &add(ctx, &mul(ctx, &a, &b).unwrap(), &c).unwrap(), &a).unwrap();
        assert_eq!(
            session.open_int(&expr).unwrap(),
            vec![17 * 3 - 2 - 17, -9 * 40 + 5 + 9, 1000 * -7 + 11 - 1000]
        );
    }

    #[test]
    fn test_matmul_fxp() {
        let session = Session::default_with_seed(32).unwrap();
        let ctx = session.ctx();
        let x = mantle_hal::constant_fxp_slice(ctx, &[1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let y = mantle_hal::constant_fxp_slice(ctx, &[0.5, -1.0, 1.5, 2.0], &[2, 2]).unwrap();
        let xs = mantle_hal::seal(ctx, &x).unwrap();
        let ys = mantle_hal::seal(ctx, &y).unwrap();
        let z = matmul(ctx, &xs, &ys).unwrap();
        let opened = mantle_hal::decode_fxp(ctx, &mantle_hal::reveal(ctx, &z).unwrap()).unwrap();
        assert_close(&opened, &[3.5, 3.0, 7.5, 5.0], 1e-4);
    }
}

// =========================================================================
// Section 3: Dispatch properties
// =========================================================================

mod dispatch_tests {
    use super::*;

    #[test]
    fn test_mixed_mul_symmetric_and_single_scaled() {
        let session = Session::default_with_seed(33).unwrap();
        let ctx = session.ctx();
        let i = session.share_int(&[3, -2], DataType::I32).unwrap();
        let f = session.share_fxp(&[1.5, 2.25]).unwrap();

        let a = mul(ctx, &i, &f).unwrap();
        let b = mul(ctx, &f, &i).unwrap();
        assert!(a.is_fxp() && b.is_fxp());

        // Both orders open to identical ring values: the integer side is
        // never rescaled, so no truncation noise enters at all.
        let ra = mantle_hal::reveal(ctx, &a).unwrap();
        let rb = mantle_hal::reveal(ctx, &b).unwrap();
        assert_eq!(
            ra.as_public().unwrap().elems(),
            rb.as_public().unwrap().elems()
        );
        assert_close(
            &mantle_hal::decode_fxp(ctx, &ra).unwrap(),
            &[4.5, -4.5],
            1e-9,
        );
    }

    #[test]
    fn test_int_promotion_dispatch() {
        let session = Session::default_with_seed(34).unwrap();
        let ctx = session.ctx();
        let small = session.share_int(&[100], DataType::I8).unwrap();
        let big = session.share_int(&[1000], DataType::I64).unwrap();
        let sum = add(ctx, &small, &big).unwrap();
        assert_eq!(sum.dtype(), DataType::I64);
        assert_eq!(session.open_int(&sum).unwrap(), vec![1100]);
    }

    #[test]
    fn test_bitcast_idempotent() {
        let session = Session::default_with_seed(35).unwrap();
        let ctx = session.ctx();
        let x = session.share_fxp(&[1.25, -2.5]).unwrap();
        let cast = bitcast(ctx, &x, DataType::I64).unwrap();
        assert_eq!(cast.dtype(), DataType::I64);
        let back = bitcast(ctx, &cast, x.dtype()).unwrap();
        assert_eq!(session.open_fxp(&back).unwrap(), vec![1.25, -2.5]);
    }

    #[test]
    fn test_comparisons_and_select() {
        let session = Session::default_with_seed(36).unwrap();
        let ctx = session.ctx();
        let x = session.share_fxp(&[1.0, 2.0, -3.0]).unwrap();
        let y = session.share_fxp(&[2.0, 2.0, -4.0]).unwrap();

        let lt = less(ctx, &x, &y).unwrap();
        assert_eq!(session.open_int(&lt).unwrap(), vec![1, 0, 0]);
        let eq = equal(ctx, &x, &y).unwrap();
        assert_eq!(session.open_int(&eq).unwrap(), vec![0, 1, 0]);

        let chosen = select(ctx, &lt, &x, &y).unwrap();
        assert_close(&session.open_fxp(&chosen).unwrap(), &[1.0, 2.0, -4.0], 1e-4);
    }

    #[test]
    fn test_sign_of_zero_is_positive() {
        let session = Session::default_with_seed(37).unwrap();
        let ctx = session.ctx();
        let x = session.share_fxp(&[0.0, -1.0, 3.0]).unwrap();
        let s = sign(ctx, &x).unwrap();
        assert_eq!(session.open_int(&s).unwrap(), vec![1, -1, 1]);
    }

    #[test]
    fn test_idiv_corrects_to_exact_quotient() {
        let session = Session::default_with_seed(38).unwrap();
        let ctx = session.ctx();
        let x = session.share_int(&[17, -17, 100, 7], DataType::I64).unwrap();
        let y = session.share_int(&[5, 5, -7, 9], DataType::I64).unwrap();
        let q = idiv(ctx, &x, &y).unwrap();
        assert_eq!(session.open_int(&q).unwrap(), vec![3, -3, -14, 0]);
    }
}

// =========================================================================
// Section 4: Approximation accuracy at the public entry points
// =========================================================================

mod approximation_tests {
    use super::*;

    #[test]
    fn test_log_accuracy_over_domain() {
        let session = Session::default_with_seed(40).unwrap();
        let ctx = session.ctx();
        let inputs = [1e-4, 0.01, 0.5, 1.0, 3.0, 45.0, 250.0];
        let x = session.share_fxp(&inputs).unwrap();
        let out = session.open_fxp(&log(ctx, &x).unwrap()).unwrap();
        let want: Vec<f64> = inputs.iter().map(|v| v.ln()).collect();
        assert_rel(&out, &want, 0.02);
    }

    #[test]
    fn test_exp_pade_accuracy_wide() {
        let config = RuntimeConfig {
            fxp_exp_mode: ExpMode::Pade,
            ..Default::default()
        };
        let session = Session::new(config, 41).unwrap();
        let ctx = session.ctx();
        let inputs = [-8.0, -2.5, 0.0, 2.5, 8.0];
        let x = session.share_fxp(&inputs).unwrap();
        let out = session.open_fxp(&exp(ctx, &x).unwrap()).unwrap();
        let want: Vec<f64> = inputs.iter().map(|v| v.exp()).collect();
        assert_rel(&out, &want, 0.01);
    }

    #[test]
    fn test_tanh_saturates_beyond_clamp() {
        let session = Session::default_with_seed(42).unwrap();
        let ctx = session.ctx();
        let x = session.share_fxp(&[-10.0, -0.5, 0.5, 10.0]).unwrap();
        let out = session.open_fxp(&tanh(ctx, &x).unwrap()).unwrap();
        assert_close(&out[1..3], &[(-0.5f64).tanh(), 0.5f64.tanh()], 1e-3);
        // Outside [-3, 3] the entry clamps, so the result rides at tanh(3).
        assert_close(&out[..1], &[-(3f64.tanh())], 1e-3);
        assert_close(&out[3..], &[3f64.tanh()], 1e-3);
    }

    #[test]
    fn test_rsqrt_across_magnitudes() {
        // At f=18 the normalisation covers (2^-18, 2^17); the full
        // published range needs the wider FM128 encoding below.
        let session = Session::default_with_seed(43).unwrap();
        let ctx = session.ctx();
        let inputs = [2f64.powi(-10), 0.25, 1.0, 7.5, 4096.0, 2f64.powi(15)];
        let x = session.share_fxp(&inputs).unwrap();
        let out = session.open_fxp(&rsqrt(ctx, &x).unwrap()).unwrap();
        let want: Vec<f64> = inputs.iter().map(|v| 1.0 / v.sqrt()).collect();
        assert_rel(&out, &want, 0.003);
    }

    #[test]
    fn test_rsqrt_wide_range_on_fm128() {
        let config = RuntimeConfig {
            field: Field::Fm128,
            ..Default::default()
        };
        let session = Session::new(config, 44).unwrap();
        let ctx = session.ctx();
        // f defaults to 26 on FM128, which reaches the whole published
        // range.
        let inputs = [2f64.powi(-20), 0.001, 1.0, 300.0, 2f64.powi(20)];
        let x = session.share_fxp(&inputs).unwrap();
        let out = session.open_fxp(&rsqrt(ctx, &x).unwrap()).unwrap();
        let want: Vec<f64> = inputs.iter().map(|v| 1.0 / v.sqrt()).collect();
        assert_rel(&out, &want, 0.003);
    }
}

// =========================================================================
// Section 5: Concrete end-to-end scenarios
// =========================================================================

mod scenario_tests {
    use super::*;

    #[test]
    fn test_scenario_mul() {
        let session = Session::default_with_seed(50).unwrap();
        let ctx = session.ctx();
        let x = session.share_fxp(&[3.5]).unwrap();
        let y = session.share_fxp(&[-2.25]).unwrap();
        let out = session.open_fxp(&mul(ctx, &x, &y).unwrap()).unwrap();
        assert_close(&out, &[-7.875], 1e-4);
    }

    #[test]
    fn test_scenario_log16() {
        let session = Session::default_with_seed(51).unwrap();
        let ctx = session.ctx();
        let x = session.share_fxp(&[16.0]).unwrap();
        let out = session.open_fxp(&log(ctx, &x).unwrap()).unwrap();
        assert_close(&out, &[2.772588722239781], 0.056);
    }

    #[test]
    fn test_scenario_rsqrt_quarter() {
        let session = Session::default_with_seed(52).unwrap();
        let ctx = session.ctx();
        let x = session.share_fxp(&[0.25]).unwrap();
        let out = session.open_fxp(&rsqrt(ctx, &x).unwrap()).unwrap();
        assert_close(&out, &[2.0], 0.006);
    }

    #[test]
    fn test_scenario_sigmoid_mm1() {
        let config = RuntimeConfig {
            sigmoid_mode: SigmoidMode::Mm1,
            ..Default::default()
        };
        let session = Session::new(config, 53).unwrap();
        let ctx = session.ctx();
        let x = session.share_fxp(&[2.0]).unwrap();
        let out = session
            .open_fxp(&mantle_hal::logistic(ctx, &x).unwrap())
            .unwrap();
        assert_close(&out, &[0.75], 1e-5);
    }

    #[test]
    fn test_scenario_division() {
        let session = Session::default_with_seed(54).unwrap();
        let ctx = session.ctx();
        let x = session.share_fxp(&[1.0]).unwrap();
        let y = session.share_fxp(&[7.0]).unwrap();
        let out = session.open_fxp(&div(ctx, &x, &y).unwrap()).unwrap();
        assert_close(&out, &[1.0 / 7.0], 1e-4);
    }

    #[test]
    fn test_scenario_mixed_mul() {
        let session = Session::default_with_seed(55).unwrap();
        let ctx = session.ctx();
        let i = session.share_int(&[3], DataType::I32).unwrap();
        let f = session.share_fxp(&[1.5]).unwrap();
        let out = session.open_fxp(&mul(ctx, &i, &f).unwrap()).unwrap();
        assert_close(&out, &[4.5], 1e-9);
    }
}

// =========================================================================
// Section 6: Context forking and session edges
// =========================================================================

mod context_tests {
    use super::*;

    #[test]
    fn test_forked_context_matches_parent_results() {
        let session = Session::default_with_seed(60).unwrap();
        let ctx = session.ctx();
        let child = ctx.fork();

        let x = session.share_fxp(&[1.5, -2.0]).unwrap();
        let y = session.share_fxp(&[0.5, 3.0]).unwrap();

        let parent = mul(ctx, &x, &y).unwrap();
        let forked = mul(&child, &x, &y).unwrap();

        let a = mantle_hal::decode_fxp(ctx, &mantle_hal::reveal(ctx, &parent).unwrap()).unwrap();
        let b =
            mantle_hal::decode_fxp(&child, &mantle_hal::reveal(&child, &forked).unwrap()).unwrap();
        assert_close(&a, &b, 1e-4);
    }

    #[test]
    fn test_non_broadcastable_shapes_fail() {
        let session = Session::default_with_seed(61).unwrap();
        let ctx = session.ctx();
        let x = session.share_fxp(&[1.0, 2.0, 3.0]).unwrap();
        let y = session.share_fxp(&[1.0, 2.0]).unwrap();
        assert!(add(ctx, &x, &y).is_err());
    }

    #[test]
    fn test_fm32_field_end_to_end() {
        let config = RuntimeConfig {
            field: Field::Fm32,
            ..Default::default()
        };
        let session = Session::new(config, 62).unwrap();
        let ctx = session.ctx();
        // f defaults to 8 on FM32.
        let x = session.share_fxp(&[1.5]).unwrap();
        let y = session.share_fxp(&[2.5]).unwrap();
        let out = session.open_fxp(&mul(ctx, &x, &y).unwrap()).unwrap();
        assert_close(&out, &[3.75], 0.02);
    }

    #[test]
    fn test_power() {
        let session = Session::default_with_seed(63).unwrap();
        let ctx = session.ctx();
        let x = session.share_fxp(&[2.0, 3.0]).unwrap();
        let y = session.share_fxp(&[2.0, 1.5]).unwrap();
        let out = session
            .open_fxp(&mantle_hal::power(ctx, &x, &y).unwrap())
            .unwrap();
        assert_rel(&out, &[4.0, 3f64.powf(1.5)], 0.05);
    }
}
