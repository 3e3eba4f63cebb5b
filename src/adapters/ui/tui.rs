//! Implements InputPort. Inquire-based interactive planning flow.
//!
//! Instruction -> suggested candidates -> operator approval -> commit.
//! Decisions are made here, at the edge; the planner only applies them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{MultiSelect, Select, Text};

use crate::domain::{
    CalendarEvent, CommitDecision, CommitKind, CommitPlan, CommitPlanItem, CommitResult,
    DomainError, SuggestResponse,
};
use crate::ports::{EventStorePort, InputPort};
use crate::usecases::PlannerService;

const MENU_PLAN: &str = "Plan events from an instruction";
const MENU_STORED: &str = "Show stored events";
const MENU_QUIT: &str = "Quit";

/// TUI adapter. Inquire prompts over the planner service.
pub struct TuiInputPort {
    planner: Arc<PlannerService>,
    store: Arc<dyn EventStorePort>,
}

impl TuiInputPort {
    pub fn new(planner: Arc<PlannerService>, store: Arc<dyn EventStorePort>) -> Self {
        Self { planner, store }
    }

    async fn run_plan_flow(&self) -> Result<(), DomainError> {
        let instruction = Text::new("Instruction:")
            .with_help_message("e.g. \"deep work tomorrow morning, dentist on Friday at 3\"")
            .prompt()
            .map_err(|e| DomainError::Input(e.to_string()))?;
        if instruction.trim().is_empty() {
            println!("Nothing to plan.");
            return Ok(());
        }

        let response = self
            .with_spinner("Asking the model for candidates...", self.planner.suggest(&instruction, None, None))
            .await?;
        if response.candidates.is_empty() {
            println!("No candidates. Configure CAL_SYNC_AI_API_KEY or rephrase the instruction.");
            return Ok(());
        }

        let plan = match self.approve(response)? {
            Some(plan) => plan,
            None => {
                println!("Nothing approved; no changes made.");
                return Ok(());
            }
        };

        let result = self
            .with_spinner("Applying the plan...", self.planner.commit(plan))
            .await;
        print_result(&result);
        Ok(())
    }

    /// Operator review: every candidate becomes a plan item, approved ones as
    /// create, the rest as explicit skips. Returns None when nothing was
    /// approved.
    fn approve(&self, response: SuggestResponse) -> Result<Option<CommitPlan>, DomainError> {
        let labels: Vec<String> = response.candidates.iter().map(format_candidate).collect();
        let selected = MultiSelect::new("Approve events to create:", labels.clone())
            .prompt()
            .map_err(|e| DomainError::Input(e.to_string()))?;
        if selected.is_empty() {
            return Ok(None);
        }

        let items = labels
            .into_iter()
            .zip(response.candidates)
            .map(|(label, event)| {
                let decision = if selected.contains(&label) {
                    CommitDecision { kind: CommitKind::Create, reason: None }
                } else {
                    CommitDecision {
                        kind: CommitKind::Skip,
                        reason: Some("not approved".to_string()),
                    }
                };
                CommitPlanItem { event, decision }
            })
            .collect();

        Ok(Some(CommitPlan {
            items,
            trace_id: response.trace_id,
        }))
    }

    async fn run_stored_flow(&self) -> Result<(), DomainError> {
        let payloads = self.store.list_all().await?;
        if payloads.is_empty() {
            println!("The local store is empty.");
            return Ok(());
        }
        for payload in &payloads {
            match serde_json::to_string_pretty(payload) {
                Ok(pretty) => println!("{}", pretty),
                Err(_) => println!("{}", payload),
            }
        }
        println!("{} stored event(s).", payloads.len());
        Ok(())
    }

    async fn with_spinner<T>(
        &self,
        message: &str,
        fut: impl std::future::Future<Output = T>,
    ) -> T {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        let out = fut.await;
        spinner.finish_and_clear();
        out
    }
}

fn format_candidate(event: &CalendarEvent) -> String {
    format!(
        "{} | {} .. {} ({})",
        event.title,
        event.start.format("%Y-%m-%d %H:%M"),
        event.end.format("%H:%M"),
        event.timezone
    )
}

fn print_result(result: &CommitResult) {
    println!(
        "Done: {} created, {} updated, {} skipped (trace {})",
        result.created, result.updated, result.skipped, result.trace_id
    );
    for error in &result.errors {
        println!("  error: {}", error);
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let choice = Select::new("What next?", vec![MENU_PLAN, MENU_STORED, MENU_QUIT])
                .prompt()
                .map_err(|e| DomainError::Input(e.to_string()))?;
            match choice {
                MENU_PLAN => self.run_plan_flow().await?,
                MENU_STORED => self.run_stored_flow().await?,
                _ => return Ok(()),
            }
        }
    }
}
