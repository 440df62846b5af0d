/// payment desk - overpayment credit and misc balance top-ups
use installment_plan_rs::chrono::{NaiveDate, TimeZone, Utc};
use installment_plan_rs::{
    InMemoryMiscLedger, InMemoryPlanRepository, InstallmentDesk, InstallmentPlan,
    MiscBalanceLedger, Money, ReconciliationConfig, SafeTimeProvider, TimeSource,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== payment desk ===\n");

    let clock = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 2, 16, 10, 0, 0).single().ok_or("bad date")?,
    ));
    let control = clock.test_control().expect("test time source");
    let mut desk = InstallmentDesk::new(
        InMemoryPlanRepository::new(),
        InMemoryMiscLedger::new().with_balance("cust-007", Money::from_major(300)),
        clock,
    );

    let rules = ReconciliationConfig {
        auto_apply_misc_balance: true,
        ..ReconciliationConfig::default()
    };

    let plan_id = desk.open_plan(
        InstallmentPlan::builder()
            .customer_id("cust-007")
            .base_amount(Money::from_major(30_000))
            .down_payment(Money::from_major(6_000))
            .rate_percent(dec!(0))
            .tenure_months(6)
            .start_date(NaiveDate::from_ymd_opt(2025, 1, 15).ok_or("bad date")?)
            .reconciliation(rules),
    )?;

    // short by 500, the 300 credit tops it up
    let receipt = desk.pay_installment(plan_id, 1, Money::from_major(3_500))?;
    println!("installment 1 cash: {:?}", receipt.cash.status);
    if let Some(misc) = &receipt.misc {
        println!("installment 1 misc: {} applied, {} still owed", misc.applied, misc.remaining_for_entry);
    }

    // settle the rest and overpay
    let receipt = desk.pay_installment(plan_id, 1, Money::from_major(1_000))?;
    println!(
        "installment 1 settled: credited {} to misc balance",
        receipt.credited_to_misc_balance
    );
    println!("misc balance now: {}", desk.ledger().balance("cust-007"));

    // a month later, use the credit first
    control.set(Utc.with_ymd_and_hms(2025, 3, 15, 10, 0, 0).single().ok_or("bad date")?);
    if let Some(result) = desk.apply_misc_balance(plan_id, 2)? {
        println!("installment 2: {} from misc balance, {} still owed", result.applied, result.remaining_for_entry);
    }

    let plan = desk.plan(plan_id)?;
    println!("\n{}", plan.json());

    Ok(())
}
