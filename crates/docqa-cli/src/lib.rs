//! Routed question answering front end for docqa
//!
//! The intent router, the calculator with its safe arithmetic evaluator, the
//! `Assistant` context object and the terminal UI helpers.

mod assistant;
mod calculator;
mod expression;
mod router;
mod ui;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

pub use assistant::{Assistant, Outcome, Response};
pub use calculator::{Calculation, Calculator, extract_expression};
pub use expression::{Value, evaluate};
pub use router::IntentRouter;
pub use ui::{
    EXIT_COMMANDS, display_banner, is_exit_command, print_answer, print_diagnostics, print_error,
    print_route, read_question,
};

// Re-export core types
pub use docqa_core::{Error, ExpressionError, Intent, Result};
