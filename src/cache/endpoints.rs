//! Endpoint catalogs of the portal's API surfaces.
//!
//! Each read declares the tags it provides and each write the tags it
//! invalidates; the [`TagCache`](super::TagCache) uses these to decide what
//! to refetch.

use super::query::{QueryParam, build_query};

/// Tag for bank account records.
pub const BANK_DETAILS: &str = "bankDetails";
/// Tag for the booking history and its cancellation/reissue tickets.
pub const FLIGHT_BOOKING_HISTORY: &str = "flightBookingHistory";
/// Tag for the signed-in user.
pub const USER: &str = "user";
/// Tag for the signed-in user's profile.
pub const USER_PROFILE: &str = "userProfile";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Read that provides the listed tags
    Query { provides: &'static [&'static str] },
    /// Write that invalidates the listed tags on success
    Mutation {
        invalidates: &'static [&'static str],
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub name: &'static str,
    pub method: HttpMethod,
    /// Path template; `{name}` segments are filled by [`Endpoint::path_with`].
    pub path: &'static str,
    pub kind: EndpointKind,
}

impl Endpoint {
    const fn query(
        name: &'static str,
        path: &'static str,
        provides: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            method: HttpMethod::Get,
            path,
            kind: EndpointKind::Query { provides },
        }
    }

    const fn mutation(
        name: &'static str,
        method: HttpMethod,
        path: &'static str,
        invalidates: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            method,
            path,
            kind: EndpointKind::Mutation { invalidates },
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self.kind, EndpointKind::Query { .. })
    }

    pub fn provides(&self) -> &'static [&'static str] {
        match self.kind {
            EndpointKind::Query { provides } => provides,
            EndpointKind::Mutation { .. } => &[],
        }
    }

    pub fn invalidates(&self) -> &'static [&'static str] {
        match self.kind {
            EndpointKind::Mutation { invalidates } => invalidates,
            EndpointKind::Query { .. } => &[],
        }
    }

    /// Fill `{name}` placeholders from `params`. Unknown placeholders are
    /// left in place.
    pub fn path_with(&self, params: &[(&str, &str)]) -> String {
        let mut path = self.path.to_string();
        for (name, value) in params {
            path = path.replace(&format!("{{{}}}", name), value);
        }
        path
    }

    /// Path plus the encoded list filters, if any survive filtering.
    pub fn url_with(&self, params: &[(&str, &str)], filters: &[QueryParam]) -> String {
        let path = self.path_with(params);
        let query = build_query(filters);
        if query.is_empty() {
            path
        } else {
            format!("{}?{}", path, query)
        }
    }
}

/// A named collection of endpoints sharing one cache.
#[derive(Debug)]
pub struct ApiSurface {
    pub name: &'static str,
    pub tag_types: &'static [&'static str],
    pub endpoints: &'static [Endpoint],
}

impl ApiSurface {
    pub fn endpoint(&self, name: &str) -> Option<&'static Endpoint> {
        let endpoints: &'static [Endpoint] = self.endpoints;
        endpoints.iter().find(|e| e.name == name)
    }
}

const BANK_URL: &str = "/admin/payment/bank";
const BANK_ITEM_URL: &str = "/admin/payment/bank/{id}";

pub static BANK_API: ApiSurface = ApiSurface {
    name: "bank",
    tag_types: &["admin", "users", "reports", BANK_DETAILS],
    endpoints: &[
        Endpoint::query("getAllBanks", BANK_URL, &[BANK_DETAILS]),
        Endpoint::mutation("createBank", HttpMethod::Post, BANK_URL, &[BANK_DETAILS]),
        Endpoint::mutation("updateBank", HttpMethod::Put, BANK_ITEM_URL, &[BANK_DETAILS]),
        Endpoint::mutation("patchBank", HttpMethod::Patch, BANK_ITEM_URL, &[BANK_DETAILS]),
        Endpoint::mutation("deleteBank", HttpMethod::Delete, BANK_ITEM_URL, &[BANK_DETAILS]),
    ],
};

const CANCELLATION_URL: &str = "/b2b-service/flight-cancellation/cancellation";
const REISSUE_URL: &str = "/b2b-service/flight-cancellation/reissued";

pub static FLIGHT_BOOKING_HISTORY_API: ApiSurface = ApiSurface {
    name: "flight_booking_history",
    tag_types: &[FLIGHT_BOOKING_HISTORY],
    endpoints: &[
        Endpoint::query(
            "getFlightBookingHistory",
            "/b2c-service/booking/my-bookings",
            &[FLIGHT_BOOKING_HISTORY],
        ),
        Endpoint::query(
            "getFlightBookingById",
            "/b2c-service/booking/{bookingNumber}",
            &[FLIGHT_BOOKING_HISTORY],
        ),
        Endpoint::mutation(
            "flightCancellation",
            HttpMethod::Post,
            CANCELLATION_URL,
            &[FLIGHT_BOOKING_HISTORY],
        ),
        Endpoint::query(
            "getCancellationTicket",
            CANCELLATION_URL,
            &[FLIGHT_BOOKING_HISTORY],
        ),
        Endpoint::query("getReIssueTicket", REISSUE_URL, &[FLIGHT_BOOKING_HISTORY]),
        Endpoint::mutation(
            "flightReIssue",
            HttpMethod::Post,
            REISSUE_URL,
            &[FLIGHT_BOOKING_HISTORY],
        ),
    ],
};

pub static AUTH_API: ApiSurface = ApiSurface {
    name: "auth",
    tag_types: &[USER, USER_PROFILE],
    endpoints: &[
        Endpoint::mutation(
            "sendLoginRequest",
            HttpMethod::Post,
            "/auth-service/auth/send-login-request",
            &[],
        ),
        Endpoint::mutation("register", HttpMethod::Post, "/auth-service/users", &[]),
        Endpoint::mutation(
            "createSubUser",
            HttpMethod::Post,
            "/auth-service/users/create-sub-b2b-account",
            &[],
        ),
        Endpoint::mutation(
            "tempUserRegister",
            HttpMethod::Post,
            "/auth-service/users/temp-user",
            &[],
        ),
        Endpoint::query(
            "getUserProfile",
            "/auth-service/auth/profile",
            &[USER, USER_PROFILE],
        ),
        Endpoint::mutation(
            "updateProfile",
            HttpMethod::Patch,
            "/auth-service/users/{id}",
            &[USER],
        ),
        Endpoint::mutation(
            "updateUser",
            HttpMethod::Patch,
            "/auth-service/users/{id}",
            &[USER, USER_PROFILE],
        ),
        Endpoint::mutation(
            "verifyAccount",
            HttpMethod::Post,
            "/auth-service/auth/verify/{email}",
            &[],
        ),
        Endpoint::mutation(
            "forgetPassword",
            HttpMethod::Post,
            "/auth-service/auth/forgot-password",
            &[],
        ),
        Endpoint::mutation(
            "getTokenOTPforgetPassword",
            HttpMethod::Post,
            "/auth-service/auth/forgot-password/set-otp",
            &[],
        ),
        Endpoint::mutation(
            "resetPassword",
            HttpMethod::Post,
            "/auth-service/auth/forgot-password/token-to-set-password",
            &[],
        ),
        Endpoint::mutation(
            "changePassword",
            HttpMethod::Post,
            "/auth-service/auth/change-password",
            &[],
        ),
    ],
};

/// Every API surface of the portal.
pub static API_SURFACES: &[&ApiSurface] = &[&BANK_API, &FLIGHT_BOOKING_HISTORY_API, &AUTH_API];
