mod sms;

pub use sms::{
    DeliveryOutcome, DeliveryService, FakeSmsGateway, ISmsGateway, SmsError, SmsReceipt,
    TwilioCredentials, TwilioSmsGateway,
};
