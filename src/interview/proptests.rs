//! Property-based tests for turn bookkeeping
//!
//! Whatever mix of on-topic, off-topic and failing turns is played:
//! - every completed turn adds exactly one user and one assistant message
//! - short-circuited turns never touch the history
//! - a failing turn adds exactly one unanswered user message
//! - the system message stays first and is never visible in feedback

use super::*;
use crate::agent::testing::MockLlmClient;
use crate::agent::ToolCallingAgent;
use crate::conversation::Role;
use crate::filter::UNRELATED_KEYWORDS;
use crate::llm::{LlmError, LlmResponse};
use crate::tools::ToolRegistry;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    OnTopic(String),
    OffTopic(String),
    Missing,
    Reset,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => "[0-9]{1,3} years building APIs".prop_map(Step::OnTopic),
        2 => (0..UNRELATED_KEYWORDS.len(), "[0-9 ]{0,10}")
            .prop_map(|(i, pad)| Step::OffTopic(format!("{pad}{}", UNRELATED_KEYWORDS[i]))),
        1 => Just(Step::Missing),
        1 => Just(Step::Reset),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn service(llm: Arc<MockLlmClient>) -> InterviewService {
    let store = Arc::new(ConversationStore::new("sys", None));
    InterviewService::new(store, Arc::new(ToolCallingAgent::new(llm, ToolRegistry::new(), 1)))
}

proptest! {
    #[test]
    fn prop_history_length_tracks_completed_turns(steps in proptest::collection::vec(arb_step(), 0..25)) {
        let llm = Arc::new(MockLlmClient::new("mock"));
        for _ in 0..steps.len() {
            llm.queue_response(LlmResponse::from_text("Next question?"));
        }
        let service = service(llm);

        let mut completed = 0usize;
        runtime().block_on(async {
            for step in &steps {
                match step {
                    Step::OnTopic(text) => {
                        let outcome = service.handle_turn(Some(text.as_str())).await.unwrap();
                        assert!(matches!(outcome, TurnOutcome::Completed { .. }));
                        completed += 1;
                    }
                    Step::OffTopic(text) => {
                        let outcome = service.handle_turn(Some(text.as_str())).await.unwrap();
                        assert_eq!(outcome.reply(), CANNED_REPLY);
                    }
                    Step::Missing => {
                        let outcome = service.handle_turn(None).await.unwrap();
                        assert_eq!(outcome.reply(), CANNED_REPLY);
                    }
                    Step::Reset => {
                        service.reset().await;
                        completed = 0;
                    }
                }
            }
        });

        let history = service.history();
        prop_assert_eq!(history.len(), 1 + 2 * completed);
        prop_assert_eq!(history[0].role, Role::System);
        prop_assert_eq!(service.feedback().len(), 2 * completed);
        prop_assert!(service.feedback().iter().all(|m| m.role != Role::System));
    }

    #[test]
    fn prop_failure_leaves_one_trailing_user_message(k in 0usize..6) {
        let llm = Arc::new(MockLlmClient::new("mock"));
        for _ in 0..k {
            llm.queue_response(LlmResponse::from_text("And then?"));
        }
        llm.queue_error(LlmError::server_error("unavailable"));
        let service = service(llm);

        let failed = runtime().block_on(async {
            for i in 0..k {
                service.handle_turn(Some(format!("answer {i}").as_str())).await.unwrap();
            }
            service.handle_turn(Some("final answer")).await
        });

        prop_assert!(failed.is_err());
        let history = service.history();
        prop_assert_eq!(history.len(), 1 + 2 * k + 1);
        prop_assert_eq!(history.last().map(|m| m.role), Some(Role::User));
    }
}
