//! Property tests for the lifecycle, filter and aggregation engines

use chrono::{Duration, TimeZone, Utc};
use courrier_core::{
    aggregate, filter_courriers, Courrier, CourrierState, FilterSpec, NewCourrier, Priority,
    RoleScope, SortOrder, TransitionPolicy,
};
use proptest::prelude::*;

fn state_strategy() -> impl Strategy<Value = CourrierState> {
    (0usize..5).prop_map(|i| CourrierState::ALL[i])
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Normal),
        Just(Priority::Urgent),
        Just(Priority::VeryUrgent),
        Just(Priority::Unrecognized("low".to_string())),
    ]
}

fn courrier_strategy() -> impl Strategy<Value = Courrier> {
    (
        0u8..4,
        0u8..4,
        priority_strategy(),
        0i64..10_000,
        "[a-z ]{0,12}",
    )
        .prop_map(|(entity, creator, priority, minutes, subject)| {
            let now =
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes);
            let draft = NewCourrier {
                courier_type: "1".to_string(),
                category: "1".to_string(),
                to_entity: format!("e{}", entity),
                subject: format!("s {}", subject),
                priority,
                ..Default::default()
            };
            Courrier::create(
                format!("c{}", minutes),
                "ESTSB-202401-AAAAA",
                draft,
                &format!("u{}", creator),
                now,
            )
            .unwrap()
        })
}

proptest! {
    #[test]
    fn history_tracks_every_change(targets in prop::collection::vec(state_strategy(), 0..20)) {
        let mut c = Courrier::create(
            "c1",
            "ESTSB-202401-AAAAA",
            NewCourrier {
                courier_type: "1".into(),
                category: "1".into(),
                to_entity: "1".into(),
                subject: "sujet".into(),
                ..Default::default()
            },
            "u1",
            Utc::now(),
        )
        .unwrap();

        for target in &targets {
            c.change_state(*target, "u1", None, &TransitionPolicy::Permissive, Utc::now()).unwrap();
        }

        prop_assert_eq!(c.history.len(), targets.len() + 1);
        prop_assert_eq!(c.history.last().unwrap().state, c.state);
        prop_assert!(c.history_is_consistent());
    }

    #[test]
    fn no_op_spec_is_identity(all in prop::collection::vec(courrier_strategy(), 0..30)) {
        let view = filter_courriers(&all, &FilterSpec::default());
        let expected: Vec<&Courrier> = all.iter().collect();
        prop_assert_eq!(view, expected);
    }

    #[test]
    fn agent_scope_is_exact(all in prop::collection::vec(courrier_strategy(), 0..30)) {
        let spec = FilterSpec {
            role_scope: RoleScope::Agent {
                user_id: "u1".to_string(),
                entity_id: "e2".to_string(),
            },
            ..Default::default()
        };
        let view = filter_courriers(&all, &spec);

        let admitted = |c: &Courrier| c.to_entity == "e2" || c.created_by == "u1";
        prop_assert!(view.iter().all(|c| admitted(*c)));
        prop_assert_eq!(view.len(), all.iter().filter(|c| admitted(*c)).count());
    }

    #[test]
    fn priority_sort_orders_by_rank_and_is_stable(
        all in prop::collection::vec(courrier_strategy(), 0..30)
    ) {
        let view = filter_courriers(&all, &FilterSpec::new().sorted(SortOrder::Priority));

        for pair in view.windows(2) {
            prop_assert!(pair[0].priority.rank() <= pair[1].priority.rank());
        }

        // Within one rank, input order is preserved
        for rank in 0..=3u8 {
            let sorted: Vec<&Courrier> =
                view.iter().copied().filter(|c| c.priority.rank() == rank).collect();
            let original: Vec<&Courrier> =
                all.iter().filter(|c| c.priority.rank() == rank).collect();
            prop_assert_eq!(sorted, original);
        }
    }

    #[test]
    fn filter_never_grows_and_total_matches(
        all in prop::collection::vec(courrier_strategy(), 0..30),
        needle in "[a-z]{0,2}",
    ) {
        let view = filter_courriers(&all, &FilterSpec::new().query(needle));
        prop_assert!(view.len() <= all.len());

        let stats = aggregate(&all);
        prop_assert_eq!(stats.total, all.len());
        prop_assert_eq!(stats.by_state.values().sum::<usize>(), all.len());
        prop_assert_eq!(stats.by_state.len(), 5);
    }
}

#[test]
fn test_treated_then_new_scenario() {
    let mut c = Courrier::create(
        "c1",
        "ESTSB-202401-AAAAA",
        NewCourrier {
            courier_type: "1".into(),
            category: "1".into(),
            to_entity: "1".into(),
            subject: "sujet".into(),
            ..Default::default()
        },
        "u1",
        Utc::now(),
    )
    .unwrap();

    c.change_state(CourrierState::Treated, "u1", None, &TransitionPolicy::default(), Utc::now())
        .unwrap();
    c.change_state(CourrierState::New, "u1", None, &TransitionPolicy::default(), Utc::now())
        .unwrap();

    assert_eq!(c.state, CourrierState::New);
    assert_eq!(c.history.len(), 3);
}
