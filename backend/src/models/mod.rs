pub mod recurring;
pub mod task;

pub use recurring::{NewDefinitionRequest, Pattern, RecurringTaskDefinition};
pub use task::{Category, NewTaskRequest, Priority, Task};
