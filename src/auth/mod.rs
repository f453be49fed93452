//! Authentication module.
//!
//! Login requests are handled entirely by an interceptor that sits in front
//! of the route:
//!
//! - **Extract**: parse `{"email", "password"}` from the body
//! - **Authenticate**: look the member up and check the password
//! - **Issue**: sign the member's principal into a token and answer `{"token"}`
//!
//! Any failure is returned as an [`AuthError`] for the HTTP layer to map.
//! "Unknown member" and "wrong password" are the same error.
//!
//! Requests to other routes can carry the issued token as `Authorization:
//! Bearer <token>`; [`BearerTokenInterceptor`] verifies it and attaches an
//! [`Authentication`] to the request.
//!
//! ## Usage
//!
//! ```ignore
//! let interceptor = TokenAuthenticationInterceptor::new(member_store, jwt_provider);
//!
//! match interceptor.pre_handle(&body).await? {
//!     PipelineControl::ShortCircuit(response) => write(response),
//!     PipelineControl::Continue => next.run(request).await,
//! }
//! ```

mod context;
mod extractor;
mod interceptor;
pub mod jwt;
mod user_details;
mod user_store;

pub use context::Authentication;
pub use extractor::{AuthError, AuthenticationToken, TokenRequest, convert};
pub use interceptor::{
    APPLICATION_JSON, BearerTokenInterceptor, HandlerResponse, PipelineControl, PrincipalOf,
    TokenAuthenticationInterceptor, TokenResponse,
};
pub use jwt::{JwtTokenProvider, TokenProvider};
pub use user_details::{UserDetails, UserDetailsService};
pub use user_store::{LoginMember, MemberPrincipal, MemberStore, hash_password, verify_password};
