//! Browser-like HTTP session against the catalog

use crate::error::SirsiError;
use crate::form::Form;
use crate::parser::ResponseParser;
use log::debug;
use reqwest::Method;
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};

/// Logical catalog page a response belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Catalog home page, also the page shown after logging in or out
    Home,
    /// "My Account" menu
    MyAccount,
    /// "Renew My Materials", listing checked-out items
    RenewMaterials,
    /// "Review My Account" menu
    ReviewAccount,
    /// "Account Summary", holding the fines total
    AccountSummary,
    /// Response to a renewal submission
    RenewalResult,
}

/// The most recent response of a session
#[derive(Debug, Clone)]
pub(crate) struct Page {
    /// Final URL after redirects, used to resolve relative links
    pub url: Url,
    pub body: String,
    pub kind: PageKind,
}

/// One browsing context: a cookie jar plus the last page fetched
///
/// Every request replaces the current page. Responses are not interpreted
/// here beyond locating links and forms.
#[derive(Debug)]
pub(crate) struct Session {
    client: Client,
    parser: ResponseParser,
    current: Option<Page>,
}

impl Session {
    /// Wrap a client that must have its cookie store enabled
    pub fn new(client: Client) -> Self {
        Self {
            client,
            parser: ResponseParser::new(),
            current: None,
        }
    }

    /// The page from the last successful request, if any
    pub fn current(&self) -> Option<&Page> {
        self.current.as_ref()
    }

    fn current_or_err(&self, wanted: &str) -> Result<&Page, SirsiError> {
        self.current
            .as_ref()
            .ok_or_else(|| SirsiError::Navigation(format!("no page loaded to find {}", wanted)))
    }

    /// GET a URL directly
    pub fn open(&mut self, url: Url, kind: PageKind) -> Result<&Page, SirsiError> {
        debug!("GET {}", url);
        let request = self.client.get(url);
        self.fetch(request, kind)
    }

    /// Whether the current page has a link whose text is `text`
    pub fn has_link(&self, text: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|page| self.parser.find_link(&page.body, text).is_some())
    }

    /// Follow the link whose text is `text` on the current page
    pub fn follow_link(&mut self, text: &str, kind: PageKind) -> Result<&Page, SirsiError> {
        let page = self.current_or_err(text)?;
        let href = self.parser.find_link(&page.body, text).ok_or_else(|| {
            SirsiError::Navigation(format!("no {:?} link on {}", text, page.url))
        })?;
        let url = page.url.join(&href).map_err(|e| {
            SirsiError::Navigation(format!("bad {:?} link target {:?}: {}", text, href, e))
        })?;

        debug!("Following {:?} to {}", text, url);
        let request = self.client.get(url);
        self.fetch(request, kind)
    }

    /// Take a snapshot of a named form on the current page
    pub fn find_form(&self, name: &str) -> Result<Form, SirsiError> {
        let page = self.current_or_err(name)?;
        Form::find(&page.body, &page.url, name)
            .ok_or_else(|| SirsiError::Navigation(format!("no form {:?} on {}", name, page.url)))
    }

    /// Submit a filled-in form
    pub fn submit_form(&mut self, form: Form, kind: PageKind) -> Result<&Page, SirsiError> {
        let pairs = form.pairs();
        debug!(
            "Submitting form {:?} ({} fields) via {} {}",
            form.name,
            pairs.len(),
            form.method,
            form.action
        );

        let request = if form.method == Method::POST {
            self.client.post(form.action).form(&pairs)
        } else {
            // Browsers replace the action's query string with the fields
            let mut action = form.action;
            action.set_query(None);
            self.client.get(action).query(&pairs)
        };
        self.fetch(request, kind)
    }

    fn fetch(&mut self, request: RequestBuilder, kind: PageKind) -> Result<&Page, SirsiError> {
        // A failed request leaves the session on no page at all
        self.current = None;

        let response = request.send()?;
        let url = response.url().clone();
        if !response.status().is_success() {
            return Err(SirsiError::InvalidStatus {
                status: response.status(),
                url,
            });
        }

        let body = response.text()?;
        debug!("Loaded {:?} page from {} ({} bytes)", kind, url, body.len());
        Ok(self.current.insert(Page { url, body, kind }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let client = Client::builder().cookie_store(true).build().unwrap();
        Session::new(client)
    }

    fn url(server: &mockito::Server, path: &str) -> Url {
        Url::parse(&server.url()).unwrap().join(path).unwrap()
    }

    #[test]
    fn test_open_records_page() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<html><body>home</body></html>")
            .expect(1)
            .create();

        let mut session = session();
        assert!(session.current().is_none());
        let page = session.open(url(&server, "/"), PageKind::Home).unwrap();
        assert!(page.body.contains("home"));
        assert_eq!(session.current().map(|p| p.kind), Some(PageKind::Home));
        mock.assert();
    }

    #[test]
    fn test_non_success_status_is_an_error_and_clears_page() {
        let mut server = mockito::Server::new();
        let _home = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("ok")
            .create();
        let _broken = server.mock("GET", "/broken").with_status(503).create();

        let mut session = session();
        session.open(url(&server, "/"), PageKind::Home).unwrap();
        let err = session.open(url(&server, "/broken"), PageKind::Home).unwrap_err();

        match err {
            SirsiError::InvalidStatus { status, url } => {
                assert_eq!(status.as_u16(), 503);
                assert_eq!(url.path(), "/broken");
            }
            other => panic!("Expected InvalidStatus, got {:?}", other),
        }
        assert!(session.current().is_none());
    }

    #[test]
    fn test_follow_link_resolves_relative_href() {
        let mut server = mockito::Server::new();
        let _index = server
            .mock("GET", "/menu/index")
            .with_status(200)
            .with_body(r#"<a href="account?x=1">My Account</a>"#)
            .create();
        let target = server
            .mock("GET", "/menu/account?x=1")
            .with_status(200)
            .with_body("account")
            .expect(1)
            .create();

        let mut session = session();
        session.open(url(&server, "/menu/index"), PageKind::Home).unwrap();
        let page = session.follow_link("My Account", PageKind::MyAccount).unwrap();
        assert_eq!(page.body, "account");
        assert_eq!(page.kind, PageKind::MyAccount);
        target.assert();
    }

    #[test]
    fn test_follow_missing_link() {
        let mut server = mockito::Server::new();
        let _home = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("no links")
            .create();

        let mut session = session();
        assert!(matches!(
            session.follow_link("My Account", PageKind::MyAccount),
            Err(SirsiError::Navigation(_))
        ));

        session.open(url(&server, "/"), PageKind::Home).unwrap();
        assert!(matches!(
            session.follow_link("My Account", PageKind::MyAccount),
            Err(SirsiError::Navigation(_))
        ));
        // The page the link was looked for on stays current
        assert_eq!(session.current().map(|p| p.kind), Some(PageKind::Home));
    }

    #[test]
    fn test_cookies_persist_across_requests() {
        let mut server = mockito::Server::new();
        let _home = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("set-cookie", "SESSIONID=abc123; Path=/")
            .with_body(r#"<a href="/next">Next</a>"#)
            .create();
        let next = server
            .mock("GET", "/next")
            .match_header("cookie", "SESSIONID=abc123")
            .with_status(200)
            .with_body("next")
            .expect(1)
            .create();

        let mut session = session();
        session.open(url(&server, "/"), PageKind::Home).unwrap();
        session.follow_link("Next", PageKind::MyAccount).unwrap();
        next.assert();
    }

    #[test]
    fn test_get_form_submission_uses_query() {
        let mut server = mockito::Server::new();
        let _home = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(r#"<form name="search" action="/find"><input name="q" value="dune"></form>"#)
            .create();
        let find = server
            .mock("GET", "/find")
            .match_query(mockito::Matcher::UrlEncoded("q".into(), "dune".into()))
            .with_status(200)
            .with_body("results")
            .expect(1)
            .create();

        let mut session = session();
        session.open(url(&server, "/"), PageKind::Home).unwrap();
        let form = session.find_form("search").unwrap();
        session.submit_form(form, PageKind::Home).unwrap();
        find.assert();

        assert!(matches!(
            session.find_form("missing"),
            Err(SirsiError::Navigation(_))
        ));
    }

    #[test]
    fn test_get_form_replaces_action_query() {
        let mut server = mockito::Server::new();
        let _home = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(
                r#"<form name="search" action="/find?page=2&q=old"><input name="q" value="dune"></form>"#,
            )
            .create();
        let find = server
            .mock("GET", "/find")
            .match_query(mockito::Matcher::Exact("q=dune".into()))
            .with_status(200)
            .with_body("results")
            .expect(1)
            .create();

        let mut session = session();
        session.open(url(&server, "/"), PageKind::Home).unwrap();
        let form = session.find_form("search").unwrap();
        session.submit_form(form, PageKind::Home).unwrap();
        find.assert();
    }

    #[test]
    fn test_has_link() {
        let mut server = mockito::Server::new();
        let _home = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(r#"<a href="/account"> My
                Account </a>"#)
            .create();

        let mut session = session();
        assert!(!session.has_link("My Account"));
        session.open(url(&server, "/"), PageKind::Home).unwrap();
        assert!(session.has_link("My Account"));
        assert!(!session.has_link("Logout"));
    }
}
