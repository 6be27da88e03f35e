use super::ToolContext;
use super::store::{BookingStore, CONFIRMED, TRANSPORT_BOOKING_ID, TRANSPORT_FILE, TransportRecord};
use crate::Tool;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Deserialize, JsonSchema, Debug)]
#[serde(rename = "book_transportation")]
#[schemars(description = "Book transportation for a trip.")]
pub struct BookTransportation {
    #[schemars(description = "The trip booking ID to link transportation to")]
    pub booking_id: String,

    #[schemars(description = "Type of transport (flight, train, bus, car)")]
    pub transport_type: String,

    #[schemars(description = "Departure location")]
    pub departure: String,

    #[schemars(description = "Arrival location")]
    pub arrival: String,

    #[schemars(description = "Departure date and time in YYYY-MM-DD HH:MM format")]
    pub departure_time: String,
}

impl BookTransportation {
    /// Describes the trip this booking links to, as far as the store knows it.
    fn linked_trip(&self, store: &BookingStore) -> String {
        match store.load_trip() {
            Ok(Some(trip)) if trip.booking_id == self.booking_id => format!(
                "{} ({}, {} to {}, {})",
                self.booking_id, trip.destination, trip.start_date, trip.end_date, trip.traveler_name
            ),
            Ok(_) => format!("{} (no matching trip on file)", self.booking_id),
            Err(err) => {
                warn!(%err, "Failed to read trip booking");
                self.booking_id.clone()
            }
        }
    }
}

impl Tool for BookTransportation {
    type Context = ToolContext;

    fn apply(&self, context: Self::Context) -> String {
        let record = TransportRecord {
            transport_booking_id: TRANSPORT_BOOKING_ID.to_string(),
            trip_booking_id: self.booking_id.clone(),
            transport_type: self.transport_type.clone(),
            departure: self.departure.clone(),
            arrival: self.arrival.clone(),
            departure_time: self.departure_time.clone(),
            booking_date: BookingStore::now(),
            status: CONFIRMED.to_string(),
        };

        if let Err(err) = context.store.save_transport(&record) {
            warn!(%err, "Failed to save transportation booking");
            return format!("Error: failed to save transportation booking: {err}");
        }
        info!(trip = %record.trip_booking_id, "Transportation booked");

        format!(
            "Transportation booked successfully!\nTransport ID: {}\nType: {}\nRoute: {} → {}\nDeparture: {}\nLinked to trip: {}\nBooking saved to: {TRANSPORT_FILE}",
            record.transport_booking_id,
            record.transport_type,
            record.departure,
            record.arrival,
            record.departure_time,
            self.linked_trip(&context.store)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::BookTrip;

    fn flight(booking_id: &str) -> BookTransportation {
        BookTransportation {
            booking_id: booking_id.into(),
            transport_type: "flight".into(),
            departure: "New York".into(),
            arrival: "Paris".into(),
            departure_time: "2025-06-01 09:30".into(),
        }
    }

    #[test]
    fn links_to_the_trip_on_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let context = ToolContext::new(BookingStore::new(dir.path()), Default::default());
        BookTrip {
            traveler_name: "Jane".into(),
            destination: "Paris".into(),
            start_date: "2025-06-01".into(),
            end_date: "2025-06-10".into(),
            budget: 2000,
        }
        .apply(context.clone());

        let confirmation = flight("CURRENT_TRIP").apply(context.clone());
        assert!(confirmation.contains("Route: New York → Paris"));
        assert!(confirmation.contains("Linked to trip: CURRENT_TRIP (Paris, 2025-06-01 to 2025-06-10, Jane)"));

        let stored = context
            .store
            .load_transport()
            .expect("load")
            .expect("transport saved");
        assert_eq!(stored.transport_booking_id, TRANSPORT_BOOKING_ID);
        assert_eq!(stored.trip_booking_id, "CURRENT_TRIP");
    }

    #[test]
    fn books_even_without_a_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let context = ToolContext::new(BookingStore::new(dir.path()), Default::default());

        let confirmation = flight("TRIP-42").apply(context);
        assert!(confirmation.starts_with("Transportation booked successfully!"));
        assert!(confirmation.contains("Linked to trip: TRIP-42 (no matching trip on file)"));
    }
}
