//! Unit tests for the Money module
//!
//! Tests cover money creation, arithmetic used by audit rules,
//! currency handling, and display formatting.

use core_kernel::{Money, Currency, MoneyError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_creates_money_with_correct_amount() {
        let m = Money::new(dec!(100.50), Currency::USD);
        assert_eq!(m.amount(), dec!(100.50));
        assert_eq!(m.currency(), Currency::USD);
    }

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::new(dec!(100.123456789), Currency::USD);
        assert_eq!(m.amount(), dec!(100.1235));
    }

    #[test]
    fn test_zero_creates_zero_amount() {
        let m = Money::zero(Currency::CAD);
        assert!(m.is_zero());
        assert_eq!(m.currency(), Currency::CAD);
    }

    #[test]
    fn test_default_currency_is_usd() {
        assert_eq!(Currency::default(), Currency::USD);
    }
}

mod predicates {
    use super::*;

    #[test]
    fn test_is_positive_false_for_zero() {
        assert!(!Money::zero(Currency::USD).is_positive());
    }

    #[test]
    fn test_is_negative_true_for_negative_amount() {
        let m = Money::new(dec!(-0.01), Currency::USD);
        assert!(m.is_negative());
    }

    #[test]
    fn test_negative_zero_is_not_negative() {
        let m = Money::new(dec!(-0.00), Currency::USD);
        assert!(!m.is_negative());
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add_same_currency() {
        let a = Money::new(dec!(100.00), Currency::USD);
        let b = Money::new(dec!(50.00), Currency::USD);
        assert_eq!(a.checked_add(&b).unwrap().amount(), dec!(150.00));
    }

    #[test]
    fn test_checked_sub_currency_mismatch() {
        let a = Money::new(dec!(100.00), Currency::USD);
        let b = Money::new(dec!(50.00), Currency::EUR);
        assert!(matches!(a.checked_sub(&b), Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_line_total_from_quantity() {
        let unit_price = Money::new(dec!(35.00), Currency::USD);
        assert_eq!(unit_price.checked_mul(dec!(5)).unwrap().amount(), dec!(175.00));
    }

    #[test]
    fn test_checked_add_overflow_is_an_error() {
        let near_max = Money::new(Decimal::MAX, Currency::USD);
        let one = Money::new(dec!(1), Currency::USD);
        assert_eq!(near_max.checked_add(&one), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_sum_propagates_overflow() {
        let amounts = [
            Money::new(Decimal::MAX, Currency::USD),
            Money::new(Decimal::MAX, Currency::USD),
        ];
        assert_eq!(Money::sum(&amounts, Currency::USD), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_divide_by_zero_error() {
        let m = Money::new(dec!(100.00), Currency::USD);
        assert!(matches!(m.divide(Decimal::ZERO), Err(MoneyError::DivisionByZero)));
    }

    #[test]
    fn test_sum_rejects_mixed_currencies() {
        let amounts = [
            Money::new(dec!(10), Currency::USD),
            Money::new(dec!(10), Currency::GBP),
        ];
        assert!(Money::sum(&amounts, Currency::USD).is_err());
    }

    #[test]
    fn test_net_of_deductible_floors_at_zero() {
        let gross = Money::new(dec!(400), Currency::USD);
        let deductible = Money::new(dec!(1000), Currency::USD);
        let net = gross.checked_sub(&deductible).unwrap().floor_at_zero();
        assert!(net.is_zero());
    }
}

mod percentages {
    use super::*;

    #[test]
    fn test_percentage_of_whole() {
        let waste = Money::new(dec!(60), Currency::USD);
        let install = Money::new(dec!(300), Currency::USD);
        assert_eq!(waste.percentage_of(&install).unwrap(), dec!(20));
    }

    #[test]
    fn test_percentage_of_zero_whole_fails() {
        let part = Money::new(dec!(60), Currency::USD);
        let whole = Money::zero(Currency::USD);
        assert_eq!(part.percentage_of(&whole), Err(MoneyError::DivisionByZero));
    }
}

mod ordering_and_display {
    use super::*;

    #[test]
    fn test_same_currency_amounts_are_ordered() {
        let small = Money::new(dec!(10), Currency::USD);
        let large = Money::new(dec!(20), Currency::USD);
        assert!(small < large);
    }

    #[test]
    fn test_cross_currency_amounts_are_unordered() {
        let usd = Money::new(dec!(10), Currency::USD);
        let eur = Money::new(dec!(10), Currency::EUR);
        assert_eq!(usd.partial_cmp(&eur), None);
    }

    #[test]
    fn test_display_jpy_without_decimals() {
        let m = Money::new(dec!(1500), Currency::JPY);
        assert_eq!(m.to_string(), "¥1500");
    }

    #[test]
    fn test_round_to_currency() {
        let m = Money::new(dec!(10.4567), Currency::USD);
        assert_eq!(m.round_to_currency().amount(), dec!(10.46));
    }
}
