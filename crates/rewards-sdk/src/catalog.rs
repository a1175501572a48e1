use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Reward {
    pub name: &'static str,
    pub points: u64,
    pub description: &'static str,
    pub image: &'static str,
}

pub static CATALOG: [Reward; 3] = [
    Reward {
        name: "Annual Health Checkup",
        points: 5000,
        description: "Complete health screening package",
        image: "https://images.unsplash.com/photo-1579684385127-1ef15d508118?w=500&auto=format&fit=crop&q=60&ixlib=rb-4.0.3",
    },
    Reward {
        name: "Wellness Subscription",
        points: 7500,
        description: "3-month premium wellness app access",
        image: "https://images.unsplash.com/photo-1571019613454-1cb2f99b2d8b?w=500&auto=format&fit=crop&q=60&ixlib=rb-4.0.3",
    },
    Reward {
        name: "Medical Coverage Boost",
        points: 10000,
        description: "Additional medical coverage worth $500",
        image: "https://images.unsplash.com/photo-1505751172876-fa1923c5c528?w=500&auto=format&fit=crop&q=60&ixlib=rb-4.0.3",
    },
];

/// Case-insensitive lookup by reward name.
pub fn find_reward(name: &str) -> Option<&'static Reward> {
    let name = name.trim();
    CATALOG.iter().find(|r| r.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_costs_are_positive() {
        assert!(CATALOG.iter().all(|r| r.points > 0));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(find_reward("annual health checkup").unwrap().points, 5000);
        assert_eq!(find_reward(" Medical Coverage Boost ").unwrap().points, 10000);
        assert!(find_reward("Gym Membership").is_none());
    }
}
