pub mod order;

pub use order::{NewOrder, NewOrderLine, Order, OrderItem, OrderStatus};
