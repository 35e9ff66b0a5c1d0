/// quick start - simulate a SAC loan for a known principal
use sac_credit::chrono::NaiveDate;
use sac_credit::{CreditDemand, Money, Rate, SacCalculator, SafeTimeProvider, TimeSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let calculator = SacCalculator::default();

    // $100,000 over 12 months at 2% a month, due on the 10th
    let demand = CreditDemand::builder()
        .principal(Money::from_major(100_000))
        .operation_date(NaiveDate::from_ymd_opt(2025, 1, 15).ok_or("invalid date")?)
        .anchor_day(10)
        .term(12)
        .monthly_rate(Rate::from_percentage(2))
        .build_with_time(&time)?;

    let result = calculator.calculate(&demand, &time)?;

    for record in &result.records {
        println!(
            "{:>3} {} {:>4}d  amort {:>14}  interest {:>12}  balance {:>14}",
            record.number,
            record.due_date,
            record.period_days,
            record.amortization.format(),
            record.interest.format(),
            record.balance.format(),
        );
    }
    println!("net value: {}", result.net_value.format());

    Ok(())
}
