//! Which order actions each role may take in each status.
//!
//! Lifecycle edges:
//!
//! ```text
//! PENDING   -> CONFIRMED | CANCELLED
//! CONFIRMED -> SHIPPED   | CANCELLED
//! SHIPPED   -> DELIVERED
//! ```
//!
//! The table here only decides what the client offers; the backend
//! validates every transition again.

use std::fmt;
use std::str::FromStr;

use super::errors::DomainError;
use super::order::OrderStatus;
use super::session::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OrderAction {
    Confirm,
    Cancel,
    Send,
    Deliver,
    Edit,
}

impl OrderAction {
    pub const ALL: [OrderAction; 5] = [
        OrderAction::Confirm,
        OrderAction::Cancel,
        OrderAction::Send,
        OrderAction::Deliver,
        OrderAction::Edit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderAction::Confirm => "confirm",
            OrderAction::Cancel => "cancel",
            OrderAction::Send => "send",
            OrderAction::Deliver => "deliver",
            OrderAction::Edit => "edit",
        }
    }

    /// Status reached after the action. `Edit` keeps the status; actions that
    /// are not an edge out of `from` yield `None`.
    pub fn target(self, from: OrderStatus) -> Option<OrderStatus> {
        use OrderStatus::*;
        match (from, self) {
            (Pending, OrderAction::Confirm) => Some(Confirmed),
            (Pending | Confirmed, OrderAction::Cancel) => Some(Cancelled),
            (Confirmed, OrderAction::Send) => Some(Shipped),
            (Shipped, OrderAction::Deliver) => Some(Delivered),
            (Pending, OrderAction::Edit) => Some(Pending),
            _ => None,
        }
    }

    /// Whether the action moves the order to another status.
    pub fn is_transition(self) -> bool {
        self != OrderAction::Edit
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderAction::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown order action '{}'", s)))
    }
}

/// Immutable set of permitted actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSet(&'static [OrderAction]);

impl ActionSet {
    pub const NONE: ActionSet = ActionSet(&[]);

    pub fn contains(&self, action: OrderAction) -> bool {
        self.0.contains(&action)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = OrderAction> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &'static [OrderAction] {
        self.0
    }
}

/// The full permission table.
pub fn allowed_actions(status: OrderStatus, role: Role) -> ActionSet {
    use OrderAction::*;
    match (status, role) {
        (OrderStatus::Pending, Role::Admin) => ActionSet(&[Confirm, Cancel]),
        (OrderStatus::Pending, Role::Customer) => ActionSet(&[Cancel, Edit]),
        (OrderStatus::Confirmed, Role::Admin) => ActionSet(&[Send, Cancel]),
        (OrderStatus::Shipped, Role::Admin) => ActionSet(&[Deliver]),
        (OrderStatus::Confirmed | OrderStatus::Shipped, Role::Customer) => ActionSet::NONE,
        (OrderStatus::Delivered | OrderStatus::Cancelled, _) => ActionSet::NONE,
    }
}

pub fn is_allowed(status: OrderStatus, role: Role, action: OrderAction) -> bool {
    allowed_actions(status, role).contains(action)
}

pub fn check(status: OrderStatus, role: Role, action: OrderAction) -> Result<(), DomainError> {
    if is_allowed(status, role, action) {
        Ok(())
    } else {
        Err(DomainError::NotPermitted { action, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(status: OrderStatus, role: Role) -> Vec<OrderAction> {
        let mut v: Vec<_> = allowed_actions(status, role).iter().collect();
        v.sort();
        v
    }

    #[test]
    fn admin_table() {
        use OrderAction::*;
        assert_eq!(actions(OrderStatus::Pending, Role::Admin), vec![Confirm, Cancel]);
        assert_eq!(actions(OrderStatus::Confirmed, Role::Admin), vec![Cancel, Send]);
        assert_eq!(actions(OrderStatus::Shipped, Role::Admin), vec![Deliver]);
        assert!(allowed_actions(OrderStatus::Delivered, Role::Admin).is_empty());
        assert!(allowed_actions(OrderStatus::Cancelled, Role::Admin).is_empty());
    }

    #[test]
    fn customer_table() {
        use OrderAction::*;
        assert_eq!(actions(OrderStatus::Pending, Role::Customer), vec![Cancel, Edit]);
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert!(allowed_actions(status, Role::Customer).is_empty());
        }
    }

    #[test]
    fn terminal_statuses_allow_nothing() {
        for role in [Role::Admin, Role::Customer] {
            for status in OrderStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
                assert_eq!(allowed_actions(status, role), ActionSet::NONE);
            }
        }
    }

    #[test]
    fn every_allowed_action_follows_a_lifecycle_edge() {
        for status in OrderStatus::ALL {
            for role in [Role::Admin, Role::Customer] {
                for action in allowed_actions(status, role).iter() {
                    assert!(
                        action.target(status).is_some(),
                        "{} allowed from {} without an edge",
                        action,
                        status
                    );
                }
            }
        }
    }

    #[test]
    fn transitions_never_move_backward() {
        fn rank(s: OrderStatus) -> u8 {
            match s {
                OrderStatus::Pending => 0,
                OrderStatus::Confirmed => 1,
                OrderStatus::Shipped => 2,
                OrderStatus::Delivered | OrderStatus::Cancelled => 3,
            }
        }
        for status in OrderStatus::ALL {
            for action in OrderAction::ALL.into_iter().filter(|a| a.is_transition()) {
                if let Some(next) = action.target(status) {
                    assert!(rank(next) > rank(status));
                }
            }
        }
    }

    #[test]
    fn customer_cancel_on_confirmed_is_rejected() {
        let err = check(OrderStatus::Confirmed, Role::Customer, OrderAction::Cancel).unwrap_err();
        assert!(matches!(
            err,
            DomainError::NotPermitted {
                action: OrderAction::Cancel,
                status: OrderStatus::Confirmed
            }
        ));
    }

    #[test]
    fn edit_keeps_pending_status() {
        assert_eq!(
            OrderAction::Edit.target(OrderStatus::Pending),
            Some(OrderStatus::Pending)
        );
        assert_eq!(OrderAction::Edit.target(OrderStatus::Confirmed), None);
    }

    #[test]
    fn action_parses_case_insensitively() {
        assert_eq!("Deliver".parse::<OrderAction>().unwrap(), OrderAction::Deliver);
        assert!("ship".parse::<OrderAction>().is_err());
    }
}
