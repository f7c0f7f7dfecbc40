pub fn default_seed() -> u64 {
    42
}

pub fn default_duration() -> u64 {
    1000
}

pub fn default_tick_size() -> u64 {
    1
}

pub fn default_pricing() -> f64 {
    0.5
}

pub fn default_sip_latency() -> super::LatencySetting {
    super::LatencySetting::Ticks(0)
}
