/// plan config json - load plan terms from a template
use installment_plan_rs::chrono::{TimeZone, Utc};
use installment_plan_rs::{InstallmentPlan, PlanConfig, SafeTimeProvider, TimeSource};

const TEMPLATE: &str = r#"{
    "terms": {
        "base_amount": "45000",
        "down_payment": "5000",
        "interest_rate_percent": "18",
        "tenure_months": 9,
        "start_date": "2025-03-31"
    },
    "reconciliation": {
        "settle_tolerance": "0.01",
        "credit_overpayment": true,
        "auto_apply_misc_balance": false
    }
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = PlanConfig::from_json(TEMPLATE)?;
    let clock = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 3, 31, 10, 0, 0).single().ok_or("bad date")?,
    ));

    let plan = InstallmentPlan::builder()
        .customer_id("cust-100")
        .config(config)
        .build(&clock)?;

    for entry in plan.entries() {
        println!(
            "#{:<2} {}  emi {:>10}  principal {:>10}  interest {:>8}  balance {:>10}  {:?}",
            entry.installment_no,
            entry.due_date,
            entry.emi_amount,
            entry.principal,
            entry.interest,
            entry.balance,
            entry.status,
        );
    }
    println!("total payable: {}", plan.total_payable());

    Ok(())
}
