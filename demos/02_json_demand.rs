/// loosely typed json request in, display json out
use sac_credit::serialization::ResultView;
use sac_credit::{BorrowerKind, SacCalculator, SafeTimeProvider, TimeSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let calculator = SacCalculator::default();

    let request = serde_json::json!({
        "financiado": "$ 45000",
        "data_operacao": "2025-03-08",
        "diabase": 5,
        "prazoMeses": 18,
        "jurosAm": "1,8%",
        "carenciaDias": 40,
        "jurosNaCarencia": true,
        "tac": {"kind": "currency", "value": "350"},
        "flat": 0.005,
        "simplesn": true,
    });

    let result = calculator.calculate_json(&request, BorrowerKind::Company, &time)?;
    println!("{}", ResultView::from_result(&result).to_json_pretty()?);

    Ok(())
}
