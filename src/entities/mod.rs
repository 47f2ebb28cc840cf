pub mod account;
pub mod container;
pub mod task;
pub mod task_user;
pub mod tasklist;

pub use account::Entity as Account;
pub use container::Entity as Container;
pub use task::Entity as Task;
pub use task_user::Entity as TaskUser;
pub use tasklist::Entity as Tasklist;
