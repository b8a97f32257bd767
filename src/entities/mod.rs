pub mod category;
pub mod payment_method;
pub mod product;
pub mod sale;

pub use category::Entity as Category;
pub use payment_method::Entity as PaymentMethod;
pub use product::Entity as Product;
pub use sale::Entity as Sale;
