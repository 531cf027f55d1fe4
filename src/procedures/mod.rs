//! Typed catalog of the stored procedures the gateway may call.
//!
//! Request bodies arrive as JSON objects whose values, in key order, are the
//! positional arguments (or as plain JSON arrays). They are checked against the
//! declared parameter list here, before any SQL is built, so a wrong arity or a
//! value of the wrong kind never reaches the database.

mod macros;

use serde_json::Value;

use crate::error::GatewayError;
use crate::types::RowValues;
use macros::procedure_catalog;

/// Conversion of one JSON request value into a typed procedure argument.
pub trait ProcedureArg: Sized {
    /// # Errors
    /// A short reason when `value` cannot represent this argument.
    fn from_json(value: &Value) -> Result<Self, String>;

    fn into_row_value(self) -> RowValues;
}

impl ProcedureArg for String {
    fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Null => Err("is required".to_string()),
            other => Err(format!("expected text, got {other}")),
        }
    }

    fn into_row_value(self) -> RowValues {
        RowValues::Text(self)
    }
}

impl ProcedureArg for i64 {
    fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                        .map(|f| f as i64)
                })
                .ok_or_else(|| format!("expected an integer, got {n}")),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| format!("expected an integer, got {s:?}")),
            Value::Null => Err("is required".to_string()),
            other => Err(format!("expected an integer, got {other}")),
        }
    }

    fn into_row_value(self) -> RowValues {
        RowValues::Int(self)
    }
}

impl ProcedureArg for bool {
    fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
            Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(format!("expected a boolean, got {s:?}")),
            },
            Value::Null => Err("is required".to_string()),
            other => Err(format!("expected a boolean, got {other}")),
        }
    }

    fn into_row_value(self) -> RowValues {
        RowValues::Bool(self)
    }
}

impl<T: ProcedureArg> ProcedureArg for Option<T> {
    fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_json(other).map(Some),
        }
    }

    fn into_row_value(self) -> RowValues {
        self.map_or(RowValues::Null, ProcedureArg::into_row_value)
    }
}

fn check_arity(name: &str, params: &[&str], got: usize) -> Result<(), GatewayError> {
    if params.len() == got {
        Ok(())
    } else {
        Err(GatewayError::MalformedRequest(format!(
            "{name} expects {} argument(s) ({}), got {got}",
            params.len(),
            params.join(", ")
        )))
    }
}

fn bad_argument(name: &str, label: &str, reason: &str) -> GatewayError {
    GatewayError::MalformedRequest(format!("{name}: argument {label} {reason}"))
}

procedure_catalog! {
    AddAirplane => "add_airplane" {
        airline_id: String = "airlineID",
        tail_num: String = "tail_num",
        seat_capacity: i64 = "seat_capacity",
        speed: i64 = "speed",
        location_id: Option<String> = "locationID",
        plane_type: Option<String> = "plane_type",
        skids: Option<bool> = "skids",
        propellers: Option<i64> = "propellers",
        jet_engines: Option<i64> = "jet_engines",
    }

    AddAirport => "add_airport" {
        airport_id: String = "airportID",
        airport_name: String = "airport_name",
        city: String = "city",
        state: String = "state",
        location_id: Option<String> = "locationID",
    }

    AddPerson => "add_person" {
        person_id: String = "personID",
        first_name: String = "first_name",
        last_name: Option<String> = "last_name",
        location_id: String = "locationID",
        tax_id: Option<String> = "taxID",
        experience: Option<i64> = "experience",
        flying_airline: Option<String> = "flying_airline",
        flying_tail: Option<String> = "flying_tail",
        miles: Option<i64> = "miles",
    }

    AddUpdateLeg => "add_update_leg" {
        leg_id: String = "legID",
        distance: i64 = "distance",
        departure: String = "departure",
        arrival: String = "arrival",
    }

    AssignPilot => "assign_pilot" {
        flight_id: String = "flightID",
        person_id: String = "personID",
    }

    OfferFlight => "offer_flight" {
        flight_id: String = "flightID",
        route_id: String = "routeID",
        support_airline: Option<String> = "support_airline",
        support_tail: Option<String> = "support_tail",
        progress: Option<i64> = "progress",
        airplane_status: Option<String> = "airplane_status",
        next_time: Option<String> = "next_time",
    }

    PurchaseTicketAndSeat => "purchase_ticket_and_seat" {
        ticket_id: String = "ticketID",
        cost: Option<i64> = "cost",
        carrier: String = "carrier",
        customer: String = "customer",
        deplane_at: String = "deplane_at",
        seat_number: String = "seat_number",
    }

    /// Advances the flight simulation by one step; takes no arguments.
    SimulationCycle => "simulation_cycle" {}
}

impl ProcedureCall {
    /// Resolve `name` and type-check the request body against its parameters.
    ///
    /// `name` is matched case-insensitively. `body` may be a JSON object (values
    /// taken in key order; keys themselves are not interpreted), a JSON array,
    /// or `null` for procedures without parameters.
    ///
    /// # Errors
    /// `GatewayError::MalformedRequest` for an unknown procedure, a body of the
    /// wrong shape, a wrong argument count, or an argument of the wrong kind.
    pub fn parse(name: &str, body: &Value) -> Result<Self, GatewayError> {
        let args: Vec<&Value> = match body {
            Value::Object(map) => map.values().collect(),
            Value::Array(items) => items.iter().collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(GatewayError::MalformedRequest(format!(
                    "procedure arguments must be a JSON object or array, got {other}"
                )));
            }
        };
        Self::from_positional(&name.to_ascii_lowercase(), &args)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn object_values_follow_key_order() {
        let body = json!({
            "airportID": "ATL",
            "airport_name": "Hartsfield",
            "city": "Atlanta",
            "state": "GA",
            "locationID": null
        });
        let call = ProcedureCall::parse("add_airport", &body).unwrap();
        assert_eq!(call.name(), "add_airport");
        assert_eq!(
            call,
            ProcedureCall::AddAirport(AddAirport {
                airport_id: "ATL".into(),
                airport_name: "Hartsfield".into(),
                city: "Atlanta".into(),
                state: "GA".into(),
                location_id: None,
            })
        );
        assert_eq!(
            call.into_args(),
            vec![
                RowValues::Text("ATL".into()),
                RowValues::Text("Hartsfield".into()),
                RowValues::Text("Atlanta".into()),
                RowValues::Text("GA".into()),
                RowValues::Null,
            ]
        );
    }

    #[test]
    fn keys_are_positional_not_named() {
        // same values, different key names: still bound by position
        let body = json!({"a": "f1", "b": "p1"});
        let call = ProcedureCall::parse("Assign_Pilot", &body).unwrap();
        assert_eq!(
            call.into_args(),
            vec![RowValues::Text("f1".into()), RowValues::Text("p1".into())]
        );
    }

    #[test]
    fn arrays_and_numeric_coercion() {
        let body = json!(["leg_1", "600", "ATL", "JFK"]);
        let call = ProcedureCall::parse("add_update_leg", &body).unwrap();
        assert_eq!(
            call.into_args(),
            vec![
                RowValues::Text("leg_1".into()),
                RowValues::Int(600),
                RowValues::Text("ATL".into()),
                RowValues::Text("JFK".into()),
            ]
        );

        let plane = json!(["WestJet", "n118fm", 4, 400.0, null, "prop", 1, 2, null]);
        let args = ProcedureCall::parse("add_airplane", &plane).unwrap().into_args();
        assert_eq!(args[3], RowValues::Int(400));
        assert_eq!(args[6], RowValues::Bool(true));
        assert_eq!(args[8], RowValues::Null);
    }

    #[test]
    fn zero_argument_procedure_accepts_empty_bodies() {
        for body in [json!({}), json!([]), Value::Null] {
            let call = ProcedureCall::parse("simulation_cycle", &body).unwrap();
            assert!(call.into_args().is_empty());
        }
    }

    #[test]
    fn rejects_unknown_names_arity_and_kinds() {
        let err = ProcedureCall::parse("drop_everything", &json!([])).unwrap_err();
        assert!(err.to_string().contains("unknown procedure"));

        let err = ProcedureCall::parse("assign_pilot", &json!(["f1"])).unwrap_err();
        assert!(err.to_string().contains("expects 2 argument(s) (flightID, personID), got 1"));

        let err = ProcedureCall::parse("add_update_leg", &json!(["l", "far", "A", "B"])).unwrap_err();
        assert!(err.to_string().contains("distance expected an integer"));

        let err = ProcedureCall::parse("assign_pilot", &json!([null, "p1"])).unwrap_err();
        assert!(err.to_string().contains("flightID is required"));

        let err = ProcedureCall::parse("assign_pilot", &json!("f1")).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedRequest(_)));
    }

    #[test]
    fn catalog_lists_every_procedure() {
        assert_eq!(ProcedureCall::NAMES.len(), 8);
        assert_eq!(ProcedureCall::params_of("offer_flight").map(<[_]>::len), Some(7));
        assert_eq!(ProcedureCall::params_of("nope"), None);
    }
}
