use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::str::FromStr;

use super::error::TraceError;
use crate::geo::Coordinate;
use crate::position::PositionError;

/// A recorded (or hand-written) walk: device positions and user commands over time.
///
/// ```yaml
/// variables:
///   office: "14.6091,120.9884"
/// steps:
///   - position: "14.5995,120.9842"
///   - start: $office
///   - time: T+5s
///     position: { lat: 14.6010, lng: 120.9850 }
///   - time: T+10s
///     position_error: timeout
///   - time: T+15s
///     stop: ~
/// ```
#[derive(Debug, Clone)]
pub struct Trace {
    pub variables: HashMap<String, serde_yaml::Value>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone)]
pub struct Step {
    pub time: Option<TimeExpr>,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimeExpr {
    Relative(Duration),
    Absolute(DateTime<Utc>),
}

impl TimeExpr {
    pub fn resolve(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeExpr::Relative(d) => start + *d,
            TimeExpr::Absolute(dt) => *dt,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Position(Coordinate),
    PositionError(PositionError),
    Destination(Coordinate),
    ClearDestination,
    Start(Option<Coordinate>),
    Stop,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Position(_) => "position",
            Action::PositionError(_) => "position_error",
            Action::Destination(_) => "destination",
            Action::ClearDestination => "clear_destination",
            Action::Start(_) => "start",
            Action::Stop => "stop",
        }
    }
}

impl FromStr for Trace {
    type Err = TraceError;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        let root: serde_yaml::Value = serde_yaml::from_str(yaml)?;

        let variables: HashMap<String, serde_yaml::Value> = root
            .get("variables")
            .map(|v| serde_yaml::from_value(v.clone()))
            .transpose()?
            .unwrap_or_default();

        let steps = root
            .get("steps")
            .and_then(|v| v.as_sequence())
            .ok_or_else(|| TraceError::Step(0, "missing 'steps'".into()))?
            .iter()
            .enumerate()
            .map(|(i, v)| parse_step(i, v, &variables))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Trace { variables, steps })
    }
}

fn parse_step(
    i: usize,
    value: &serde_yaml::Value,
    vars: &HashMap<String, serde_yaml::Value>,
) -> Result<Step, TraceError> {
    let err = |msg: &str| TraceError::Step(i, msg.into());
    let map = value.as_mapping().ok_or_else(|| err("expected mapping"))?;

    let time = map
        .get("time")
        .map(|v| resolve_value(v, vars))
        .and_then(|v| v.as_str().map(String::from))
        .map(parse_time)
        .transpose()
        .map_err(|e| err(&e))?;

    let mut actions = map.iter().filter(|(k, _)| k.as_str() != Some("time"));
    let (name, value) = actions.next().ok_or_else(|| err("no action found"))?;
    if actions.next().is_some() {
        return Err(err("only one action per step"));
    }

    let name = name.as_str().ok_or_else(|| err("action must be string"))?;
    let value = resolve_value(value, vars);

    let action = match name {
        "position" => Action::Position(parse_coordinate(&value).map_err(|e| err(&e))?),
        "position_error" => {
            let code = value
                .as_str()
                .ok_or_else(|| err("position_error expects an error code"))?;
            Action::PositionError(
                PositionError::from_str(code)
                    .map_err(|_| err(&format!("unknown position error: {}", code)))?,
            )
        }
        "destination" => Action::Destination(parse_coordinate(&value).map_err(|e| err(&e))?),
        "clear_destination" => Action::ClearDestination,
        "start" => match value {
            serde_yaml::Value::Null => Action::Start(None),
            other => Action::Start(Some(parse_coordinate(&other).map_err(|e| err(&e))?)),
        },
        "stop" => Action::Stop,
        _ => return Err(err(&format!("unknown action: {}", name))),
    };

    Ok(Step { time, action })
}

/// Accepts `"lat,lng"` or `{ lat, lng }`.
fn parse_coordinate(value: &serde_yaml::Value) -> Result<Coordinate, String> {
    let parsed = match value {
        serde_yaml::Value::String(s) => Coordinate::from_str(s).map_err(|e| e.to_string())?,
        other => {
            let raw: Coordinate =
                serde_yaml::from_value(other.clone()).map_err(|e| e.to_string())?;
            Coordinate::new(raw.lat, raw.lng).map_err(|e| e.to_string())?
        }
    };
    Ok(parsed)
}

fn parse_time(s: String) -> Result<TimeExpr, String> {
    let s = s.trim();

    // Relative to the start of the replay: T+10s
    if s.to_lowercase().starts_with('t') {
        let rest = &s[1..];
        if rest.starts_with('-') {
            return Err("relative times must not be negative".into());
        }
        let dur = parse_duration(rest.strip_prefix('+').unwrap_or(rest))?;
        return Ok(TimeExpr::Relative(dur));
    }

    DateTime::parse_from_rfc3339(s)
        .map(|dt| TimeExpr::Absolute(dt.with_timezone(&Utc)))
        .map_err(|e| e.to_string())
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim())
        .map_err(|e| e.to_string())
        .and_then(|d| Duration::from_std(d).map_err(|e| e.to_string()))
}

fn resolve_value(
    value: &serde_yaml::Value,
    vars: &HashMap<String, serde_yaml::Value>,
) -> serde_yaml::Value {
    match value {
        serde_yaml::Value::String(s) => {
            let t = s.trim();
            if t.starts_with('$') && !t.contains(' ') {
                if let Some(v) = vars.get(&t[1..]) {
                    return v.clone();
                }
            }
            let mut result = s.clone();
            for (name, val) in vars {
                let pattern = format!("${}", name);
                if let Some(rep) = simple_to_string(val) {
                    result = result.replace(&pattern, &rep);
                }
            }
            serde_yaml::Value::String(result)
        }
        serde_yaml::Value::Mapping(m) => serde_yaml::Value::Mapping(
            m.iter()
                .map(|(k, v)| (k.clone(), resolve_value(v, vars)))
                .collect(),
        ),
        serde_yaml::Value::Sequence(s) => {
            serde_yaml::Value::Sequence(s.iter().map(|v| resolve_value(v, vars)).collect())
        }
        other => other.clone(),
    }
}

fn simple_to_string(v: &serde_yaml::Value) -> Option<String> {
    match v {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALK: &str = r#"
variables:
  office: "14.6091,120.9884"
  lat: 14.6010
steps:
  - position: "14.5995,120.9842"
  - start: $office
  - time: T+5s
    position: { lat: $lat, lng: 120.9850 }
  - time: T+1m
    position_error: timeout
  - time: 2026-01-12T10:00:00Z
    stop: ~
"#;

    #[test]
    fn parses_all_step_kinds() {
        let trace: Trace = WALK.parse().unwrap();
        assert_eq!(trace.steps.len(), 5);

        let office = Coordinate::new(14.6091, 120.9884).unwrap();
        assert_eq!(
            trace.steps[0].action,
            Action::Position(Coordinate::new(14.5995, 120.9842).unwrap())
        );
        assert_eq!(trace.steps[1].action, Action::Start(Some(office)));
        assert!(trace.steps[1].time.is_none());
        assert_eq!(
            trace.steps[2].action,
            Action::Position(Coordinate::new(14.6010, 120.9850).unwrap())
        );
        assert_eq!(
            trace.steps[2].time,
            Some(TimeExpr::Relative(Duration::seconds(5)))
        );
        assert_eq!(
            trace.steps[3].action,
            Action::PositionError(PositionError::Timeout)
        );
        assert_eq!(trace.steps[4].action, Action::Stop);
        assert!(matches!(trace.steps[4].time, Some(TimeExpr::Absolute(_))));
    }

    #[test]
    fn start_without_destination() {
        let trace: Trace = "steps:\n  - start: ~\n  - clear_destination: ~\n".parse().unwrap();
        assert_eq!(trace.steps[0].action, Action::Start(None));
        assert_eq!(trace.steps[1].action, Action::ClearDestination);
    }

    #[test]
    fn rejects_bad_steps() {
        let cases = [
            ("steps:\n  - teleport: ~\n", "unknown action"),
            ("steps:\n  - position: \"91,0\"\n", "latitude"),
            ("steps:\n  - position_error: lost\n", "unknown position error"),
            ("steps:\n  - time: T-5s\n    stop: ~\n", "negative"),
            ("steps:\n  - stop: ~\n    start: ~\n", "only one action"),
            ("variables: {}\n", "missing 'steps'"),
        ];
        for (yaml, expected) in cases {
            let err = yaml.parse::<Trace>().unwrap_err().to_string();
            assert!(err.contains(expected), "{yaml:?} gave {err:?}");
        }
    }

    #[test]
    fn relative_time_resolves_against_start() {
        let start = DateTime::parse_from_rfc3339("2026-01-12T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let time = parse_time("T+90s".into()).unwrap();
        assert_eq!(time.resolve(start), start + Duration::seconds(90));
    }
}
