mod validator_tests {
    use chrono::{DateTime, TimeZone, Utc};
    use guard_core::{MarketSnapshot, SafetyPolicy, TradeAction, TradingSignal};
    use rust_decimal::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::validate_signal;

    /// A Wednesday at noon UTC, inside the default liquid window.
    fn weekday_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap()
    }

    /// A clean buy: 5% stop, 10% target, 2:1 risk/reward, 2% of portfolio.
    fn clean_buy() -> TradingSignal {
        TradingSignal {
            pair: "BTC/USDT".to_string(),
            action: TradeAction::Buy,
            entry_price: dec!(50000),
            stop_loss: Some(dec!(47500)),
            take_profit: Some(dec!(55000)),
            confidence: 80.0,
            leverage: Some(1.0),
            amount: dec!(1000),
            timestamp: weekday_noon(),
        }
    }

    #[test]
    fn clean_buy_signal_passes_with_full_score() {
        let result = validate_signal(&clean_buy(), dec!(50000), &SafetyPolicy::default(), None);

        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
        // reward 5000 / risk 2500 = 2.0, so the risk/reward check adds no penalty
        assert_eq!(result.safety_score, 100);
    }

    #[test]
    fn stop_above_entry_rejected_for_buy() {
        let signal = TradingSignal {
            stop_loss: Some(dec!(50500)),
            ..clean_buy()
        };
        let result = validate_signal(&signal, dec!(50000), &SafetyPolicy::default(), None);

        assert!(!result.is_valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("stop loss must be below entry price for buy")));
        assert!(result.safety_score <= 75);
    }

    #[test]
    fn low_confidence_sell_scores_zero() {
        let policy = SafetyPolicy {
            min_confidence_threshold: 75.0,
            ..Default::default()
        };
        let signal = TradingSignal {
            action: TradeAction::Sell,
            stop_loss: Some(dec!(52500)),
            take_profit: Some(dec!(45000)),
            confidence: 60.0,
            ..clean_buy()
        };
        let result = validate_signal(&signal, dec!(50000), &policy, None);

        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("confidence")));
        assert_eq!(result.safety_score, 0);
    }

    #[test]
    fn leverage_above_seventy_percent_of_max_warns() {
        let policy = SafetyPolicy {
            max_leverage: 100.0,
            ..Default::default()
        };
        let signal = TradingSignal {
            leverage: Some(80.0),
            ..clean_buy()
        };
        let result = validate_signal(&signal, dec!(50000), &policy, None);

        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.contains("leverage")));
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("reducing leverage")));
        // leverage check floors at 75; one warning costs another 5 from the
        // count adjustment, so MIN still dominates
        assert_eq!(result.safety_score, 75);
    }

    #[test]
    fn moderate_leverage_recommended_down_without_warning() {
        let policy = SafetyPolicy {
            max_leverage: 100.0,
            ..Default::default()
        };
        let signal = TradingSignal {
            leverage: Some(50.0),
            ..clean_buy()
        };
        let result = validate_signal(&signal, dec!(50000), &policy, None);

        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("reducing leverage")));
    }

    #[test]
    fn leverage_above_max_rejected() {
        let signal = TradingSignal {
            leverage: Some(20.0),
            ..clean_buy()
        };
        let result = validate_signal(&signal, dec!(50000), &SafetyPolicy::default(), None);

        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("leverage")));
        // still advised to deleverage even though the signal is already blocked
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("reducing leverage")));
    }

    #[test]
    fn oversized_position_rejected() {
        let signal = TradingSignal {
            amount: dec!(15000),
            ..clean_buy()
        };
        let result = validate_signal(&signal, dec!(50000), &SafetyPolicy::default(), None);

        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("position size")));
    }

    #[test]
    fn tiny_notional_warns_but_passes() {
        let signal = TradingSignal {
            amount: dec!(5),
            ..clean_buy()
        };
        let result = validate_signal(&signal, dec!(50000), &SafetyPolicy::default(), None);

        assert!(result.is_valid);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("minimum viable size")));
        assert_eq!(result.safety_score, 95);
    }

    #[test]
    fn missing_stop_loss_fails_when_required() {
        let policy = SafetyPolicy {
            require_stop_loss: true,
            ..Default::default()
        };
        let signal = TradingSignal {
            stop_loss: None,
            ..clean_buy()
        };
        let result = validate_signal(&signal, dec!(50000), &policy, None);

        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("stop loss is required")));
    }

    #[test]
    fn adding_warnings_never_raises_the_score() {
        let portfolio = dec!(50000);
        let policy = SafetyPolicy::default();

        let zero_warnings = validate_signal(&clean_buy(), portfolio, &policy, None);

        let one_warning = validate_signal(
            &TradingSignal {
                take_profit: None,
                ..clean_buy()
            },
            portfolio,
            &policy,
            None,
        );

        let two_warnings = validate_signal(
            &TradingSignal {
                stop_loss: None,
                take_profit: None,
                ..clean_buy()
            },
            portfolio,
            &policy,
            None,
        );

        assert!(zero_warnings.errors.is_empty());
        assert!(one_warning.errors.is_empty());
        assert!(two_warnings.errors.is_empty());
        assert!(one_warning.warnings.len() > zero_warnings.warnings.len());
        assert!(two_warnings.warnings.len() > one_warning.warnings.len());
        assert!(one_warning.safety_score <= zero_warnings.safety_score);
        assert!(two_warnings.safety_score <= one_warning.safety_score);
    }

    #[test]
    fn directional_correctness_holds_for_random_prices() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let policy = SafetyPolicy::default();

        for _ in 0..500 {
            let entry = rng.gen_range(100.0..60000.0);
            // exits land on either side of entry, up to 8% away
            let stop = entry * rng.gen_range(0.92..1.08);
            let target = entry * rng.gen_range(0.92..1.08);
            let buy = rng.gen_bool(0.5);

            let signal = TradingSignal {
                pair: "ETH/USDT".to_string(),
                action: if buy { TradeAction::Buy } else { TradeAction::Sell },
                entry_price: Decimal::from_f64(entry).unwrap(),
                stop_loss: Some(Decimal::from_f64(stop).unwrap()),
                take_profit: Some(Decimal::from_f64(target).unwrap()),
                confidence: 90.0,
                leverage: Some(1.0),
                amount: dec!(100),
                timestamp: weekday_noon(),
            };

            let expected = if buy {
                stop < entry && entry < target
            } else {
                target < entry && entry < stop
            };

            let result = validate_signal(&signal, dec!(100000), &policy, None);
            assert_eq!(
                result.is_valid, expected,
                "action={} entry={} stop={} target={}",
                signal.action.as_str(),
                entry,
                stop,
                target
            );
        }
    }

    #[test]
    fn market_checks_skipped_without_market_data() {
        // no market snapshot: slippage/liquidity/volatility must not appear
        let result = validate_signal(&clean_buy(), dec!(50000), &SafetyPolicy::default(), None);
        assert!(result.warnings.is_empty());
        assert_eq!(result.safety_score, 100);
    }

    #[test]
    fn degraded_market_conditions_warn_without_blocking() {
        let market = MarketSnapshot {
            spread: dec!(500), // 1% of entry, above the 0.5% tolerance
            volume_24h: dec!(100000),
            realized_volatility: 0.08,
        };
        let result = validate_signal(
            &clean_buy(),
            dec!(50000),
            &SafetyPolicy::default(),
            Some(&market),
        );

        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 3);
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("reduce position size")));
        // volatility check floors at 80; 3 warnings adjust 100 down to 85
        assert_eq!(result.safety_score, 80);
    }

    #[test]
    fn poor_risk_reward_warns() {
        // risk 2500, reward 1000 -> ratio 0.4
        let signal = TradingSignal {
            take_profit: Some(dec!(51000)),
            ..clean_buy()
        };
        let result = validate_signal(&signal, dec!(50000), &SafetyPolicy::default(), None);

        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.contains("below 1:1")));
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("at least 1:1")));
        // the risk/reward check floors at 75; MIN dominates the 5-point
        // warning adjustment
        assert_eq!(result.safety_score, 75);
    }

    #[test]
    fn weekend_and_off_hours_are_advisory_only() {
        // Saturday 03:00 UTC: weekend + outside the 06:00-22:00 window
        let signal = TradingSignal {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 7, 3, 0, 0).unwrap(),
            ..clean_buy()
        };
        let result = validate_signal(&signal, dec!(50000), &SafetyPolicy::default(), None);

        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(result.safety_score, 90);
    }

    #[test]
    fn malformed_signal_fails_closed() {
        let signal = TradingSignal {
            entry_price: dec!(0),
            confidence: f64::NAN,
            ..clean_buy()
        };
        let result = validate_signal(&signal, dec!(50000), &SafetyPolicy::default(), None);

        assert!(!result.is_valid);
        assert_eq!(result.safety_score, 0);
        assert!(result.errors.iter().any(|e| e.contains("entry price")));
        assert!(result.errors.iter().any(|e| e.contains("confidence")));
    }

    #[test]
    fn non_positive_portfolio_fails_closed() {
        let result = validate_signal(&clean_buy(), dec!(0), &SafetyPolicy::default(), None);
        assert!(!result.is_valid);
        assert_eq!(result.safety_score, 0);
    }
}
