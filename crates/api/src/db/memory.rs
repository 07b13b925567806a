//! In-memory [`Store`] for tests and local runs.
//!
//! A single `tokio::sync::Mutex` guards all tables, so each operation is
//! atomic in the same way a Postgres transaction is.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use emporium_core::{
    AddressId, CartId, OrderId, OrderStatus, PaymentMethod, ProductId, Role, UserId, Validate,
};

use super::{RepositoryError, Store};
use crate::models::{
    Address, Cart, NewOrder, NewProduct, NewUser, Order, Product, ProductQuery, User,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    products: BTreeMap<ProductId, Product>,
    carts: HashMap<UserId, Cart>,
    orders: BTreeMap<OrderId, Order>,
    next_user: i32,
    next_product: i32,
    next_cart: i32,
    next_order: i32,
    unavailable: bool,
}

impl Tables {
    fn catalog_for(&self, ids: &[ProductId]) -> Vec<Product> {
        let mut found: Vec<Product> = ids
            .iter()
            .filter_map(|id| self.products.get(id).cloned())
            .collect();
        found.sort_by_key(|p| p.id);
        found.dedup_by_key(|p| p.id);
        found
    }

    fn cart_mut(&mut self, user_id: UserId) -> &mut Cart {
        let next = &mut self.next_cart;
        self.carts.entry(user_id).or_insert_with(|| {
            *next += 1;
            let mut cart = Cart::empty(user_id);
            cart.id = CartId::new(*next);
            cart
        })
    }

    fn reprice_cart(&mut self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let ids = self
            .carts
            .get(&user_id)
            .map(|c| c.product_ids.clone())
            .unwrap_or_default();
        let catalog = self.catalog_for(&ids);
        let cart = self.cart_mut(user_id);
        cart.recompute_total(&catalog);
        cart.updated_at = Utc::now();
        cart.validate()?;
        Ok(cart.clone())
    }

    fn insert_order(&mut self, order: &NewOrder) -> Order {
        self.next_order += 1;
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(self.next_order),
            user_id: order.user_id,
            product_ids: order.product_ids.clone(),
            total_price: order.total_price,
            payment_method: order.payment_method,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.orders.insert(order.id, order.clone());
        order
    }
}

/// [`Store`] keeping everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make [`Store::ping`] fail, simulating a lost database.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.tables.lock().await.unavailable = unavailable;
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        if self.tables.lock().await.unavailable {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut t = self.tables.lock().await;

        if t.users.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }
        if t.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        t.next_user += 1;
        let id = UserId::new(t.next_user);
        let now = Utc::now();
        let created = User {
            id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            address: Address {
                id: AddressId::new(id.as_i32()),
                user_id: id,
                street: user.address.street.clone(),
                city: user.address.city.clone(),
                state: user.address.state.clone(),
                zip_code: user.address.zip_code.clone(),
                country: user.address.country.clone(),
                created_at: now,
                updated_at: now,
            },
            token: None,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(id, created.clone());
        Ok(created)
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn update_tokens(
        &self,
        id: UserId,
        token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock().await;
        let user = t.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.token = token.map(str::to_owned);
        user.refresh_token = refresh_token.map(str::to_owned);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_user_role(&self, username: &str, role: Role) -> Result<User, RepositoryError> {
        let mut t = self.tables.lock().await;
        let user = t
            .users
            .values_mut()
            .find(|u| u.username == username)
            .ok_or(RepositoryError::NotFound)?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut t = self.tables.lock().await;
        t.next_product += 1;
        let now = Utc::now();
        let created = Product {
            id: ProductId::new(t.next_product),
            name: product.name.trim().to_owned(),
            description: product.description.trim().to_owned(),
            price: product.price,
            rating: product.rating,
            image: product.image.trim().to_owned(),
            created_at: now,
            updated_at: now,
        };
        t.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.tables.lock().await.products.values().cloned().collect())
    }

    async fn search_products(
        &self,
        query: &ProductQuery,
    ) -> Result<Vec<Product>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.products
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect())
    }

    async fn find_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.tables.lock().await.catalog_for(ids))
    }

    async fn find_cart(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.tables.lock().await.carts.get(&user_id).cloned())
    }

    async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, RepositoryError> {
        let mut t = self.tables.lock().await;
        if !t.products.contains_key(&product_id) {
            return Err(RepositoryError::NotFound);
        }
        t.cart_mut(user_id).product_ids.push(product_id);
        t.reprice_cart(user_id)
    }

    async fn remove_from_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, RepositoryError> {
        let mut t = self.tables.lock().await;
        let removed = t
            .carts
            .get_mut(&user_id)
            .is_some_and(|cart| cart.remove_one(product_id));
        if !removed {
            return Err(RepositoryError::NotFound);
        }
        t.reprice_cart(user_id)
    }

    async fn checkout_cart(
        &self,
        user_id: UserId,
        payment_method: PaymentMethod,
    ) -> Result<Order, RepositoryError> {
        let mut t = self.tables.lock().await;
        let cart = t
            .carts
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| Cart::empty(user_id));
        let catalog = t.catalog_for(&cart.product_ids);
        let order = NewOrder::from_cart(&cart, payment_method, &catalog)?;
        let order = t.insert_order(&order);

        t.cart_mut(user_id).product_ids.clear();
        t.reprice_cart(user_id)?;
        Ok(order)
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        order.validate()?;
        Ok(self.tables.lock().await.insert_order(order))
    }

    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let t = self.tables.lock().await;
        let mut orders: Vec<Order> = t
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.tables.lock().await.orders.get(&id).cloned())
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut t = self.tables.lock().await;
        let order = t.orders.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if order.status != from {
            return Err(RepositoryError::Conflict(format!(
                "order is {}, expected {from}",
                order.status
            )));
        }
        order.status = to;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::AddressInput;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            first_name: "Grace".to_owned(),
            last_name: "Hopper".to_owned(),
            username: username.to_owned(),
            password_hash: "$argon2id$stub".to_owned(),
            email: emporium_core::Email::parse(email).unwrap(),
            phone: "555-0100".to_owned(),
            role: Role::User,
            address: AddressInput {
                street: "1 Navy Way".to_owned(),
                city: "Arlington".to_owned(),
                state: "VA".to_owned(),
                zip_code: "22202".to_owned(),
                country: "US".to_owned(),
            },
        }
    }

    fn new_product(name: &str, cents: i64) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: "desc".to_owned(),
            price: Decimal::new(cents, 2),
            rating: 4.0,
            image: "https://cdn.example.com/x.png".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email_conflict() {
        let store = MemoryStore::new();
        store.create_user(&new_user("grace", "grace@example.com")).await.unwrap();

        let err = store
            .create_user(&new_user("grace", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(ref m) if m.starts_with("username")));

        let err = store
            .create_user(&new_user("hopper", "grace@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(ref m) if m.starts_with("email")));
    }

    #[tokio::test]
    async fn test_cart_add_remove_checkout() {
        let store = MemoryStore::new();
        let user = store.create_user(&new_user("grace", "grace@example.com")).await.unwrap();
        let mug = store.create_product(&new_product("Mug", 1200)).await.unwrap();

        store.add_to_cart(user.id, mug.id).await.unwrap();
        let cart = store.add_to_cart(user.id, mug.id).await.unwrap();
        assert_eq!(cart.total_price, Decimal::new(2400, 2));

        let cart = store.remove_from_cart(user.id, mug.id).await.unwrap();
        assert_eq!(cart.product_ids, [mug.id]);

        let order = store.checkout_cart(user.id, PaymentMethod::Cod).await.unwrap();
        assert_eq!(order.total_price, Decimal::new(1200, 2));
        assert_eq!(order.status, OrderStatus::Pending);

        let cart = store.find_cart(user.id).await.unwrap().unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_unknown_product_and_missing_item() {
        let store = MemoryStore::new();
        let user = store.create_user(&new_user("grace", "grace@example.com")).await.unwrap();

        assert!(matches!(
            store.add_to_cart(user.id, ProductId::new(9)).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(
            store.remove_from_cart(user.id, ProductId::new(9)).await,
            Err(RepositoryError::NotFound)
        ));
        // Failed mutations leave no cart behind.
        assert!(store.find_cart(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_checkout_is_invalid() {
        let store = MemoryStore::new();
        let user = store.create_user(&new_user("grace", "grace@example.com")).await.unwrap();
        let err = store
            .checkout_cart(user.id, PaymentMethod::Digital)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Invalid(ref e) if e.first().field == "product_ids"));
        assert!(store.find_cart(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_status_update_is_compare_and_set() {
        let store = MemoryStore::new();
        let user = store.create_user(&new_user("grace", "grace@example.com")).await.unwrap();
        let mug = store.create_product(&new_product("Mug", 1200)).await.unwrap();
        let order = store
            .create_order(&NewOrder {
                user_id: user.id,
                product_ids: vec![mug.id],
                total_price: mug.price,
                payment_method: PaymentMethod::Digital,
            })
            .await
            .unwrap();

        store
            .update_order_status(order.id, OrderStatus::Pending, OrderStatus::Shipped)
            .await
            .unwrap();
        let err = store
            .update_order_status(order.id, OrderStatus::Pending, OrderStatus::Canceled)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_ping_reports_unavailable() {
        let store = MemoryStore::new();
        assert!(store.ping().await.is_ok());
        store.set_unavailable(true).await;
        assert!(store.ping().await.is_err());
    }
}
