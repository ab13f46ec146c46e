pub mod admins;
pub mod classes;
pub mod complaints;
pub mod health;
pub mod notices;
pub mod students;
pub mod subjects;
pub mod teachers;
