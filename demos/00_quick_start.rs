/// quick start - build a plan, take a payment, print the state
use installment_plan_rs::chrono::{Duration, TimeZone, Utc};
use installment_plan_rs::{InstallmentPlan, Money, SafeTimeProvider, TimeSource};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let clock = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).single().ok_or("bad date")?,
    ));
    let control = clock.test_control().expect("test time source");

    // a 100,000 purchase with 20,000 down, 12.5% over a year
    let mut plan = InstallmentPlan::builder()
        .customer_id("cust-001")
        .base_amount(Money::from_major(100_000))
        .down_payment(Money::from_major(20_000))
        .rate_percent(dec!(12.5))
        .tenure_months(12)
        .build(&clock)?;

    println!("emi: {}", plan.emi_amount());
    println!("total interest: {}", plan.total_interest());

    // first installment falls due a month later
    control.advance(Duration::days(31));
    let result = plan.pay_installment(1, Money::from_major(8_000), &clock)?;
    println!("installment 1: {:?}, overpayment {}", result.status, result.overpayment);

    println!("{}", plan.json());

    Ok(())
}
