use chrono::Timelike;
use serde::Serialize;

/// Part of the day, used to greet the user on the daily view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Before noon is morning, before 18:00 afternoon, the rest evening.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }

    pub fn from_time(time: impl Timelike) -> Self {
        TimeOfDay::from_hour(time.hour())
    }

    pub fn greeting(self) -> Greeting {
        match self {
            TimeOfDay::Morning => Greeting {
                title: "MORNING PROTOCOL",
                message: "NEURAL SYSTEMS INITIALIZED FOR OPTIMAL DAY CYCLE",
            },
            TimeOfDay::Afternoon => Greeting {
                title: "MIDDAY PROTOCOL",
                message: "CONTINUING OPTIMAL PERFORMANCE PARAMETERS",
            },
            TimeOfDay::Evening => Greeting {
                title: "EVENING PROTOCOL",
                message: "INITIATING REST CYCLE PREPARATION SEQUENCE",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Greeting {
    pub title: &'static str,
    pub message: &'static str,
}
