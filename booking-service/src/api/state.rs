use std::sync::Arc;

use crate::domain::service::BookingService;

pub struct BookingAppState {
    pub booking_service: Arc<BookingService>,
}
