use super::ToolContext;
use super::store::{BookingStore, CONFIRMED, TRIP_BOOKING_ID, TRIP_FILE, TripRecord};
use crate::Tool;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Deserialize, JsonSchema, Debug)]
#[serde(rename = "book_trip")]
#[schemars(description = "Book a trip and save the booking details to a file.")]
pub struct BookTrip {
    #[schemars(description = "Full name of the traveler")]
    pub traveler_name: String,

    #[schemars(description = "Destination city/country")]
    pub destination: String,

    #[schemars(description = "Trip start date in YYYY-MM-DD format")]
    pub start_date: String,

    #[schemars(description = "Trip end date in YYYY-MM-DD format")]
    pub end_date: String,

    #[schemars(description = "Total budget in USD")]
    #[serde(deserialize_with = "super::whole_number")]
    pub budget: u32,
}

impl Tool for BookTrip {
    type Context = ToolContext;

    fn apply(&self, context: Self::Context) -> String {
        let record = TripRecord {
            booking_id: TRIP_BOOKING_ID.to_string(),
            traveler_name: self.traveler_name.clone(),
            destination: self.destination.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            budget: self.budget,
            booking_date: BookingStore::now(),
            status: CONFIRMED.to_string(),
        };

        if let Err(err) = context.store.save_trip(&record) {
            warn!(%err, "Failed to save trip booking");
            return format!("Error: failed to save trip booking: {err}");
        }
        info!(destination = %record.destination, "Trip booked");

        format!(
            "Trip booked successfully!\nBooking ID: {}\nTraveler: {}\nDestination: {}\nDates: {} to {}\nBudget: ${}\nBooking saved to: {TRIP_FILE}",
            record.booking_id,
            record.traveler_name,
            record.destination,
            record.start_date,
            record.end_date,
            record.budget
        )
    }
}
