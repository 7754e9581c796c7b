//! Patron account operations and page navigation

use crate::error::SirsiError;
use crate::form::{self, LOGIN_FORM, RENEW_FORM};
use crate::item::Item;
use crate::parser::ResponseParser;
use crate::session::{Page, PageKind, Session};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::fmt;
use std::time::Duration;
use zeroize::Zeroizing;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `User-Agent`; some catalogs reject requests that do not look like a browser
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

const MY_ACCOUNT: (&str, PageKind) = ("My Account", PageKind::MyAccount);
const RENEW_MATERIALS: &[(&str, PageKind)] = &[
    MY_ACCOUNT,
    ("Renew My Materials", PageKind::RenewMaterials),
];
const ACCOUNT_SUMMARY: &[(&str, PageKind)] = &[
    MY_ACCOUNT,
    ("Review My Account", PageKind::ReviewAccount),
    ("Account Summary", PageKind::AccountSummary),
];

/// A patron account on a SirsiDynix catalog
///
/// SirsiDynix offers patrons no API, so the account drives the same HTML
/// pages a browser would. It logs in on demand, and again once if the
/// catalog drops the session in the middle of an operation.
///
/// # Example
///
/// ```no_run
/// use sirsi_client::Account;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut account = Account::new("https://catalog.example.org/", "21234000123456", "1234")?;
///
/// for item in account.items()? {
///     println!("{}", item);
/// }
/// println!("You owe ${}", account.fines()?);
/// println!("{}", account.renew_all()?);
/// # Ok(())
/// # }
/// ```
pub struct Account {
    catalog: reqwest::Url,
    userid: String,
    password: Zeroizing<String>,
    session: Session,
    parser: ResponseParser,
}

impl Account {
    /// Create an account with the default HTTP configuration
    ///
    /// # Arguments
    ///
    /// * `catalog` - Catalog home page URL, including the scheme
    /// * `userid` - Patron card number
    /// * `password` - Patron PIN
    ///
    /// # Errors
    ///
    /// Returns `SirsiError::ClientInit` if the URL is invalid or the HTTP
    /// client cannot be initialized.
    pub fn new(catalog: &str, userid: &str, password: &str) -> Result<Self, SirsiError> {
        Self::builder()
            .catalog(catalog)?
            .credentials(userid, password)
            .build()
    }

    /// Create a builder for configuring an account
    pub fn builder() -> AccountBuilder {
        AccountBuilder::new()
    }

    /// Catalog home page URL
    pub fn catalog(&self) -> &reqwest::Url {
        &self.catalog
    }

    /// Patron card number
    pub fn userid(&self) -> &str {
        &self.userid
    }

    /// Whether the most recently loaded page greets the patron
    ///
    /// This is `false` before any page has been loaded.
    pub fn is_logged_in(&self) -> bool {
        self.session
            .current()
            .is_some_and(|page| self.parser.has_login_marker(&page.body))
    }

    /// The logical page the session is currently on
    pub fn current_page(&self) -> Option<PageKind> {
        self.session.current().map(|page| page.kind)
    }

    /// Log in through the catalog home page
    ///
    /// # Errors
    ///
    /// * `SirsiError::Navigation` - The home page has no usable login form
    /// * `SirsiError::Authentication` - The catalog did not accept the login
    pub fn login(&mut self) -> Result<(), SirsiError> {
        self.session.open(self.catalog.clone(), PageKind::Home)?;
        let login = self.session.find_form(LOGIN_FORM)?;
        let login = form::encode_login(login, &self.userid, &self.password)?;
        self.session.submit_form(login, PageKind::Home)?;

        if !self.is_logged_in() {
            return Err(SirsiError::Authentication(format!(
                "no welcome message after logging in as {}; invalid credentials or the site changed",
                self.userid
            )));
        }
        info!("Logged in to {} as {}", self.catalog, self.userid);
        Ok(())
    }

    /// Log out through the "Logout" link on the home page
    pub fn logout(&mut self) -> Result<(), SirsiError> {
        self.session.open(self.catalog.clone(), PageKind::Home)?;
        self.session.follow_link("Logout", PageKind::Home)?;
        info!("Logged out {}", self.userid);
        Ok(())
    }

    /// All checked-out materials
    pub fn items(&mut self) -> Result<Vec<Item>, SirsiError> {
        self.visit(RENEW_MATERIALS)?;
        let items = self.parser.parse_items(&self.page()?.body)?;
        debug!("Found {} checked-out items", items.len());
        Ok(items)
    }

    /// Total fines owed
    pub fn fines(&mut self) -> Result<Decimal, SirsiError> {
        self.visit(ACCOUNT_SUMMARY)?;
        self.parser.parse_fines(&self.page()?.body)
    }

    /// Renew every checked-out item in one request
    ///
    /// The catalog decides which items are actually renewed; the returned
    /// status message reports the outcome.
    ///
    /// # Errors
    ///
    /// Returns `SirsiError::Navigation` if the renewal form or its
    /// "renew all" selection is missing.
    pub fn renew_all(&mut self) -> Result<String, SirsiError> {
        self.visit(RENEW_MATERIALS)?;
        let renewal = self.session.find_form(RENEW_FORM)?;
        let renewal = form::encode_renew_all(renewal)?;
        info!("Renewing all items for {}", self.userid);
        self.submit_renewal(renewal)
    }

    /// Renew the given items in one request
    ///
    /// # Errors
    ///
    /// Returns `SirsiError::FormField` naming the first item that has no
    /// control on the renewal form. Nothing is submitted in that case.
    pub fn renew(&mut self, items: &[Item]) -> Result<String, SirsiError> {
        self.visit(RENEW_MATERIALS)?;
        let renewal = self.session.find_form(RENEW_FORM)?;
        let renewal = form::encode_renew_selected(renewal, items)?;
        info!("Renewing {} items for {}", items.len(), self.userid);
        self.submit_renewal(renewal)
    }

    fn submit_renewal(&mut self, renewal: form::Form) -> Result<String, SirsiError> {
        let page = self.session.submit_form(renewal, PageKind::RenewalResult)?;
        let status = self.parser.parse_renewal_status(&page.body)?;
        info!("Renewal status: {}", status);
        Ok(status)
    }

    /// Walk a chain of links while logged in
    ///
    /// Logs in first when needed. If the chain lands on a page without the
    /// login marker the session expired on the way, so the patron is logged
    /// in again and the chain retried once.
    fn visit(&mut self, chain: &[(&str, PageKind)]) -> Result<(), SirsiError> {
        let mut logged_in_here = false;
        loop {
            if !self.is_logged_in() {
                self.login()?;
                logged_in_here = true;
            }

            match self.follow_chain(chain) {
                Err(e) if e.is_transport() => return Err(e),
                outcome if self.is_logged_in() => return outcome,
                _ if logged_in_here => {
                    return Err(SirsiError::Authentication(format!(
                        "session for {} ended right after logging in",
                        self.userid
                    )));
                }
                _ => warn!("Session for {} expired, logging in again", self.userid),
            }
        }
    }

    /// The page the last navigation step landed on
    fn page(&self) -> Result<&Page, SirsiError> {
        self.session
            .current()
            .ok_or_else(|| SirsiError::Navigation("no page loaded".to_string()))
    }

    /// Follow `chain`, starting over from the home page when the current
    /// page does not link to its first step
    fn follow_chain(&mut self, chain: &[(&str, PageKind)]) -> Result<(), SirsiError> {
        if let Some((first, _)) = chain.first()
            && !self.session.has_link(first)
        {
            debug!("No {:?} link on the current page, reopening home", first);
            self.session.open(self.catalog.clone(), PageKind::Home)?;
        }
        for (text, kind) in chain {
            self.session.follow_link(text, *kind)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("catalog", &self.catalog.as_str())
            .field("userid", &self.userid)
            .field("page", &self.current_page())
            .finish_non_exhaustive()
    }
}

/// Builder for configuring an [`Account`]
///
/// # Example
///
/// ```no_run
/// use sirsi_client::Account;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let account = Account::builder()
///     .catalog("https://catalog.example.org/")?
///     .credentials("21234000123456", "1234")
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct AccountBuilder {
    catalog: Option<reqwest::Url>,
    userid: Option<String>,
    password: Option<Zeroizing<String>>,
    timeout: Duration,
    user_agent: String,
    client_builder: Option<reqwest::blocking::ClientBuilder>,
}

impl AccountBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            catalog: None,
            userid: None,
            password: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            client_builder: None,
        }
    }

    /// Set the catalog home page URL
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or is not HTTP(S).
    pub fn catalog(mut self, url: impl reqwest::IntoUrl) -> Result<Self, SirsiError> {
        let url = url
            .into_url()
            .map_err(|e| SirsiError::ClientInit(format!("invalid catalog URL: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SirsiError::ClientInit(format!(
                "catalog URL must be http or https: {}",
                url
            )));
        }
        self.catalog = Some(url);
        Ok(self)
    }

    /// Set the patron card number and PIN
    pub fn credentials(mut self, userid: &str, password: &str) -> Self {
        self.userid = Some(userid.to_string());
        self.password = Some(Zeroizing::new(password.to_string()));
        self
    }

    /// Set the per-request timeout (ignored with a custom client builder)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `User-Agent` header (ignored with a custom client builder)
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Use a custom HTTP client builder
    ///
    /// The cookie store is always enabled regardless of the provided
    /// configuration, since the catalog session lives in cookies.
    pub fn client_builder(mut self, builder: reqwest::blocking::ClientBuilder) -> Self {
        self.client_builder = Some(builder);
        self
    }

    /// Build the account with the configured settings
    ///
    /// # Errors
    ///
    /// Returns `SirsiError::ClientInit` if the catalog or credentials are
    /// missing, or the HTTP client cannot be initialized.
    pub fn build(self) -> Result<Account, SirsiError> {
        let catalog = self
            .catalog
            .ok_or_else(|| SirsiError::ClientInit("catalog URL is required".to_string()))?;
        let (Some(userid), Some(password)) = (self.userid, self.password) else {
            return Err(SirsiError::ClientInit("credentials are required".to_string()));
        };

        let builder = self.client_builder.unwrap_or_else(|| {
            reqwest::blocking::Client::builder()
                .use_rustls_tls()
                .timeout(self.timeout)
                .user_agent(self.user_agent)
        });
        let client = builder
            .cookie_store(true)
            .build()
            .map_err(|e| SirsiError::ClientInit(e.to_string()))?;

        Ok(Account {
            catalog,
            userid,
            password,
            session: Session::new(client),
            parser: ResponseParser::new(),
        })
    }
}

impl Default for AccountBuilder {
    fn default() -> Self {
        Self::new()
    }
}
