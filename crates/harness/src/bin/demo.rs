//! Runs the reference scenarios end to end over the dealer engine and
//! prints what each party would see after opening the results.

use mantle_hal::{div, log, logistic, mul, rsqrt, DataType, RuntimeConfig, SigmoidMode};
use mantle_harness::Session;

fn report(name: &str, got: f64, want: f64) {
    let err = (got - want).abs();
    println!("{name:<28} got {got:>12.6}  expected {want:>12.6}  |err| {err:.2e}");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("mantle demo: 2-party dealer engine, FM64, f=18\n");

    let session = Session::default_with_seed(0xC0FFEE)?;
    let ctx = session.ctx();

    // Secret multiply.
    let x = session.share_fxp(&[3.5])?;
    let y = session.share_fxp(&[-2.25])?;
    let z = mul(ctx, &x, &y)?;
    report("mul(3.5, -2.25)", session.open_fxp(&z)?[0], -7.875);

    // Natural log.
    let x = session.share_fxp(&[16.0])?;
    report("log(16)", session.open_fxp(&log(ctx, &x)?)?[0], 16f64.ln());

    // Reciprocal square root.
    let x = session.share_fxp(&[0.25])?;
    report("rsqrt(0.25)", session.open_fxp(&rsqrt(ctx, &x)?)?[0], 2.0);

    // Linear sigmoid.
    let mm1 = Session::new(
        RuntimeConfig {
            sigmoid_mode: SigmoidMode::Mm1,
            ..Default::default()
        },
        0xC0FFEE,
    )?;
    let x = mm1.share_fxp(&[2.0])?;
    report(
        "sigmoid_mm1(2.0)",
        mm1.open_fxp(&logistic(mm1.ctx(), &x)?)?[0],
        0.75,
    );

    // Goldschmidt division.
    let x = session.share_fxp(&[1.0])?;
    let y = session.share_fxp(&[7.0])?;
    report(
        "div(1, 7)",
        session.open_fxp(&div(ctx, &x, &y)?)?[0],
        1.0 / 7.0,
    );

    // Mixed int * fxp multiply, no extra truncation round.
    let i = session.share_int(&[3], DataType::I32)?;
    let f = session.share_fxp(&[1.5])?;
    report("mul(3i, 1.5f)", session.open_fxp(&mul(ctx, &i, &f)?)?[0], 4.5);

    println!("\nall scenarios opened to the expected plaintexts");
    Ok(())
}
