use bigdecimal::BigDecimal;
use proptest::prelude::*;

use storefront_client::domain::cart::{Cart, CartNotice};
use storefront_client::domain::lifecycle::{allowed_actions, OrderAction};
use storefront_client::domain::order::OrderStatus;
use storefront_client::domain::product::Product;
use storefront_client::domain::session::Role;

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    Remove(usize),
    Increase(usize),
    Decrease(usize),
    SetQuantity(usize, i64),
}

fn catalog() -> Vec<Product> {
    vec![
        Product::new(1, "Lamp", BigDecimal::from(20), 5),
        Product::new(2, "Desk", "149.5".parse().unwrap(), 1),
        Product::new(3, "Chair", BigDecimal::from(75), 0),
        Product::new(4, "Pen", "0.25".parse().unwrap(), 40),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4usize).prop_map(Op::Add),
        (0..4usize).prop_map(Op::Remove),
        (0..4usize).prop_map(Op::Increase),
        (0..4usize).prop_map(Op::Decrease),
        (0..4usize, -3..60i64).prop_map(|(i, n)| Op::SetQuantity(i, n)),
    ]
}

fn apply(cart: &mut Cart, products: &[Product], op: &Op) -> CartNotice {
    match *op {
        Op::Add(i) => cart.add(&products[i]),
        Op::Remove(i) => cart.remove(products[i].id),
        Op::Increase(i) => cart.increase(products[i].id),
        Op::Decrease(i) => cart.decrease(products[i].id),
        Op::SetQuantity(i, n) => cart.set_quantity(products[i].id, n),
    }
}

proptest! {
    #[test]
    fn quantities_stay_within_stock(ops in prop::collection::vec(op(), 0..80)) {
        let products = catalog();
        let mut cart = Cart::new();
        for op in &ops {
            apply(&mut cart, &products, op);
            for line in cart.lines() {
                prop_assert!(line.quantity >= 1);
                prop_assert!(line.quantity <= line.product.stock);
            }
        }
    }

    #[test]
    fn derived_totals_match_lines(ops in prop::collection::vec(op(), 0..80)) {
        let products = catalog();
        let mut cart = Cart::new();
        for op in &ops {
            apply(&mut cart, &products, op);
        }
        let expected = cart.lines().fold(BigDecimal::from(0), |acc, l| {
            acc + &l.product.price * BigDecimal::from(l.quantity)
        });
        prop_assert_eq!(cart.subtotal(), expected);
        prop_assert_eq!(
            cart.total_items(),
            cart.lines().map(|l| u64::from(l.quantity)).sum::<u64>()
        );
        prop_assert_eq!(cart.to_order_items().len(), cart.len());
    }

    #[test]
    fn adds_never_exceed_stock(stock in 1u32..30, extra in 1usize..10) {
        let product = Product::new(9, "Widget", BigDecimal::from(3), stock);
        let mut cart = Cart::new();
        for _ in 0..stock {
            let added = matches!(cart.add(&product), CartNotice::Added { .. });
            prop_assert!(added);
        }
        for _ in 0..extra {
            prop_assert_eq!(cart.add(&product), CartNotice::StockLimitReached { stock });
        }
        prop_assert_eq!(cart.quantity_of(9), stock);
        prop_assert_eq!(cart.len(), 1);
    }

    #[test]
    fn decrease_to_zero_removes_line(stock in 1u32..20, adds in 1u32..20) {
        let product = Product::new(9, "Widget", BigDecimal::from(3), stock);
        let mut cart = Cart::new();
        for _ in 0..adds {
            cart.add(&product);
        }
        let held = cart.quantity_of(9);
        for _ in 0..held {
            cart.decrease(9);
        }
        prop_assert!(cart.line(9).is_none());
        prop_assert!(cart.is_empty());
    }
}

#[test]
fn add_set_remove_scenario() {
    let lamp = Product::new(1, "Lamp", BigDecimal::from(20), 5);
    let mut cart = Cart::new();

    for _ in 0..3 {
        cart.add(&lamp);
    }
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.quantity_of(1), 3);
    assert_eq!(cart.subtotal(), BigDecimal::from(60));

    let notice = cart.set_quantity(1, 10);
    assert_eq!(notice, CartNotice::Adjusted { stock: 5 });
    assert!(notice.advisory().is_some());
    assert_eq!(cart.quantity_of(1), 5);
    assert_eq!(cart.subtotal(), BigDecimal::from(100));

    cart.remove(1);
    assert!(cart.is_empty());
    assert_eq!(cart.subtotal(), BigDecimal::from(0));
}

#[test]
fn lifecycle_table_samples() {
    let admin_pending: Vec<OrderAction> = allowed_actions(OrderStatus::Pending, Role::Admin)
        .iter()
        .collect();
    assert_eq!(admin_pending, vec![OrderAction::Confirm, OrderAction::Cancel]);
    for role in [Role::Admin, Role::Customer] {
        assert!(allowed_actions(OrderStatus::Delivered, role).is_empty());
        assert!(allowed_actions(OrderStatus::Cancelled, role).is_empty());
    }
    assert!(allowed_actions(OrderStatus::Confirmed, Role::Customer).is_empty());
}
