pub mod auth;
pub mod business_entities;
pub mod business_types;
pub mod currencies;
pub mod custom_field_groups;
pub mod custom_fields;
pub mod customers;
pub mod heads_ups;
pub mod health;
pub mod installments;
pub mod invoices;
pub mod matters;
pub mod notes;
pub mod practice_areas;
pub mod subcategories;
pub mod time_bills;
pub mod user_groups;
pub mod users;
