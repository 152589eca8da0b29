//! Fixed classification prompt.
//!
//! The slot list and the example answer are part of the wire contract with
//! the model; changing either changes what every stored vector means.

/// Prompt sent with every frame.
pub const TRAFFIC_PROMPT: &str = "Analyze this traffic camera image and return ONLY a numerical array with exactly 25 numbers (0-4) in this exact order:

[bikes_sidewalk, bikes_street, bikes_bike_lane, bikes_crosswalk, bikes_parked, people_sidewalk, people_street, people_crosswalk, people_waiting, people_moving, vehicles_moving, vehicles_stopped, vehicles_parked, vehicles_turning, vehicles_blocking, activity_pedestrian, activity_cycling, activity_traffic, activity_construction, activity_emergency, infrastructure_signals, infrastructure_signs, infrastructure_lanes, infrastructure_barriers, infrastructure_lighting]

Count what you see and rate: 0=none, 1=few, 2=some, 3=many, 4=crowded

Return ONLY the array like: [2,0,1,3,2,1,0,2,3,1,2,0,1,2,3,0,1,2,1,3,2,0,1,2,3]";

/// Response format requested from the query endpoint.
pub const RESPONSE_FORMAT: &str = "text";
