use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};

/// A user who has opted in to receive reminder notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: ID,
    pub phone: String,
    pub opt_in: bool,
}

impl Recipient {
    /// Only recipients that opted in and have a usable phone number
    /// are eligible for delivery.
    pub fn is_eligible(&self) -> bool {
        self.opt_in && !self.phone.trim().is_empty()
    }
}

impl Entity for Recipient {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligibility_requires_opt_in_and_phone() {
        let mut recipient = Recipient {
            id: Default::default(),
            phone: "+4799887766".into(),
            opt_in: true,
        };
        assert!(recipient.is_eligible());

        recipient.opt_in = false;
        assert!(!recipient.is_eligible());

        recipient.opt_in = true;
        recipient.phone = "  ".into();
        assert!(!recipient.is_eligible());
    }
}
