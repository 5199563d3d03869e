//! Concrete implementations of the `scheduler-kernel` contracts: the
//! schedule calculator, the time parser, the validator, and the task
//! repository backends (in-memory and SQLite).

pub mod patch;
pub mod repository;
pub mod schedule_calculator;
pub mod time_parser;
pub mod validator;

pub use repository::InMemoryTaskRepository;
#[cfg(feature = "persistence-sqlite")]
pub use repository::SqliteTaskRepository;
pub use schedule_calculator::DefaultScheduleCalculator;
pub use time_parser::DefaultTimeParser;
pub use validator::TaskValidator;
