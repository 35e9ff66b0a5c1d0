use chrono::{Datelike, NaiveDate, Weekday};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

use sac_credit::{
    compute_cost, AmortizationSystem, Amount, BorrowerKind, BusinessCalendar, CostSpec, CreditDemand,
    CreditTarget, EventStore, GrossValueSolver, IofConfig, Money, Rate, SacEngine, ScheduleGenerator,
    ScheduleKey, SolverConfig,
};

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100i32, 1u32..13u32, 1u32..32u32)
        .prop_filter_map("valid date", |(year, month, day)| NaiveDate::from_ymd_opt(year, month, day))
}

fn money_strategy(min_major: i64, max_major: i64) -> impl Strategy<Value = Money> {
    (min_major * 100..max_major * 100).prop_map(|cents| Money::from_minor(cents, 2))
}

fn rate_strategy(max_bps: u32) -> impl Strategy<Value = Rate> {
    (0u32..=max_bps).prop_map(Rate::from_bps)
}

fn demand(
    operation_date: NaiveDate,
    anchor_day: u32,
    term: u32,
    monthly_rate: Rate,
    iof: IofConfig,
) -> CreditDemand {
    CreditDemand {
        target: CreditTarget::default(),
        operation_date,
        anchor_day,
        term,
        grace_days: 0,
        monthly_rate,
        tac: CostSpec::default(),
        flat: CostSpec::default(),
        iof,
        system: AmortizationSystem::Sac,
        interest_during_grace: false,
        simplified_regime: false,
        borrower: BorrowerKind::Company,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_weekends_and_holidays_are_not_business_days(date in date_strategy()) {
        let calendar = BusinessCalendar::default();
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) || calendar.holidays(date.year()).contains(&date) {
            prop_assert!(!calendar.is_business_day(date));
        }
    }

    #[test]
    fn test_resolve_or_next_is_idempotent(date in date_strategy()) {
        let calendar = BusinessCalendar::default();
        let once = calendar.resolve_or_next(date);
        prop_assert_eq!(calendar.resolve_or_next(once), once);
        prop_assert!(calendar.is_business_day(once));
        prop_assert_eq!(once == date, calendar.is_business_day(date));
    }

    #[test]
    fn test_elapsed_days_strictly_increase(
        date in date_strategy(),
        anchor_day in 1u32..32,
        term in 1u32..120,
        grace in 0u32..361,
    ) {
        let generator = ScheduleGenerator::new(Arc::new(BusinessCalendar::default()));
        let schedule = generator
            .generate(ScheduleKey { operation_date: date, anchor_day, term, grace_days: grace })
            .unwrap();

        prop_assert_eq!(schedule.len(), term as usize + 1);
        prop_assert_eq!(schedule.dates[0].days_since_operation, 0);
        for pair in schedule.dates.windows(2) {
            prop_assert!(pair[1].days_since_operation > pair[0].days_since_operation);
        }
        prop_assert!(schedule.dates[1].days_since_operation >= grace);
    }

    #[test]
    fn test_amortizations_sum_to_principal(
        date in date_strategy(),
        anchor_day in 1u32..29,
        term in 1u32..120,
        principal in money_strategy(1_000, 1_000_000),
        rate in rate_strategy(500),
    ) {
        let generator = ScheduleGenerator::new(Arc::new(BusinessCalendar::default()));
        let engine = SacEngine::new(&generator);
        let result = engine
            .calculate_with_principal(&demand(date, anchor_day, term, rate, IofConfig::company()), principal)
            .unwrap();

        prop_assert_eq!(result.records.len(), term as usize + 1);
        let sum: Money = result.installments().iter().map(|r| r.amortization).sum();
        let tolerance = Money::CENT * Decimal::from(term);
        prop_assert!((sum - principal).abs() <= tolerance);

        for pair in result.records.windows(2) {
            prop_assert!(pair[1].balance <= pair[0].balance + Money::CENT);
        }
    }

    #[test]
    fn test_percentage_cap_bounds_cost(
        principal in money_strategy(1, 5_000_000),
        value in rate_strategy(2_000),
        cap in rate_strategy(2_000),
    ) {
        let spec = CostSpec::new(Amount::percent(value)).with_cap(Amount::percent(cap));
        let mut events = EventStore::new();
        let cost = compute_cost(principal, &spec, "tac", &mut events);

        prop_assert!(cost <= principal.apply(cap));
        prop_assert!(cost <= principal.apply(value));
    }

    #[test]
    fn test_iof_never_exceeds_cap(
        date in date_strategy(),
        term in 1u32..240,
        principal in money_strategy(1_000, 1_000_000),
        rate in rate_strategy(500),
        individual in any::<bool>(),
    ) {
        let iof = if individual { IofConfig::individual() } else { IofConfig::company() };
        let generator = ScheduleGenerator::new(Arc::new(BusinessCalendar::default()));
        let engine = SacEngine::new(&generator);
        let result = engine
            .calculate_with_principal(&demand(date, 10, term, rate, iof), principal)
            .unwrap();

        let cap = result.costs.iof.cap.unwrap();
        prop_assert!(result.costs.iof.total <= cap);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_solver_round_trip(
        date in date_strategy(),
        anchor_day in 1u32..29,
        term in 1u32..60,
        net in money_strategy(1_000, 500_000),
        rate in rate_strategy(400),
        tac in rate_strategy(300),
        flat in rate_strategy(300),
    ) {
        let generator = ScheduleGenerator::new(Arc::new(BusinessCalendar::default()));
        let engine = SacEngine::new(&generator);
        let config = SolverConfig::default();

        let mut d = demand(date, anchor_day, term, rate, IofConfig::company());
        d.target = CreditTarget::net_value(net);
        d.tac = CostSpec::new(Amount::percent(tac));
        d.flat = CostSpec::new(Amount::percent(flat));

        let solved = GrossValueSolver::new(&engine, &config).solve(&d).unwrap();
        let forward = engine.calculate_with_principal(&d, solved.principal).unwrap();

        let tolerance = Money::CENT.max(solved.principal * config.relative_tolerance);
        prop_assert!((forward.net_value - net).abs() < tolerance);
        prop_assert!(solved.principal >= net);
    }
}
