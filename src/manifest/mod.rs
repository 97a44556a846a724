//! Account provider manifest parsing
//!
//! Parses the `<account>` section a package ships in its manifest into an
//! [`AccountProviderRecord`], resolving icon paths along the way.
//!
//! # Example Manifest
//!
//! ```xml
//! <manifest package="org.example">
//!   <account>
//!     <account-provider appid="org.example.mail" providerid="http://example.org/mail"
//!                       multiple-accounts-support="true">
//!       <icon section="account">mail.png</icon>
//!       <icon section="account-small">mail_small.png</icon>
//!       <label>Mail</label>
//!       <label xml:lang="en-us">Example Mail</label>
//!       <capability>http://tizen.org/account/capability/email</capability>
//!     </account-provider>
//!   </account>
//! </manifest>
//! ```

mod element;
mod parser;
mod record;

pub use element::{parse_document, Element, Node};
pub use parser::{parse, parse_file, parse_root};
pub use record::{normalize_locale, AccountProviderRecord, DEFAULT_LOCALE};
