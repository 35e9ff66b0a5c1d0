/// solve for the gross principal that releases a given net amount
use sac_credit::chrono::{TimeZone, Utc};
use sac_credit::{
    Amount, BorrowerKind, CostSpec, CreditDemand, Event, Money, Rate, SacCalculator, SafeTimeProvider,
    TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).single().ok_or("invalid time")?,
    ));
    let calculator = SacCalculator::default();

    let demand = CreditDemand::builder()
        .net_value(Money::from_major(100_000))
        .anchor_day(10)
        .term(12)
        .monthly_rate(Rate::from_percentage(2))
        .tac(CostSpec::new(Amount::percent(Rate::from_percentage(1))))
        .flat(CostSpec::new(Amount::percent(Rate::from_percentage(1))))
        .borrower(BorrowerKind::Company)
        .build_with_time(&time)?;

    let result = calculator.calculate(&demand, &time)?;

    let iterations = result
        .events
        .iter()
        .filter(|e| matches!(e, Event::SolverIteration { .. }))
        .count();

    println!("gross:      {}", result.principal.format());
    println!("net:        {}", result.net_value.format());
    println!("tac:        {}", result.costs.tac.format());
    println!("flat:       {}", result.costs.flat.format());
    println!("iof:        {}", result.costs.iof.total.format());
    println!("iterations: {}", iterations);

    Ok(())
}
