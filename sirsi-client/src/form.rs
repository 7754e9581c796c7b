//! HTML forms and the payloads submitted through them
//!
//! A [`Form`] is an owned snapshot of a `<form>` element taken from the
//! current page. Encoder functions fill it in for a specific action and the
//! session submits the resulting name/value pairs the way a browser would.

use crate::error::SirsiError;
use crate::item::Item;
use reqwest::{Method, Url};
use scraper::{ElementRef, Html, Selector};

/// Name of the login form on the catalog home page
pub(crate) const LOGIN_FORM: &str = "loginform";
/// Name of the form on the "Renew My Materials" page
pub(crate) const RENEW_FORM: &str = "renewitems";
/// Control choosing between renewing all or only the selected items
pub(crate) const SELECTION_TYPE: &str = "selection_type";
/// Value of [`SELECTION_TYPE`] that renews every item
pub(crate) const SELECT_ALL: &str = "all";

const USER_ID_FIELD: &str = "user_id";
const PASSWORD_FIELD: &str = "password";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Control {
    /// text, hidden, password, textarea and unknown input types
    Field { name: String, value: String },
    /// checkbox or radio button
    Toggle {
        name: String,
        value: String,
        checked: bool,
        radio: bool,
    },
    Select {
        name: String,
        options: Vec<String>,
        selected: Vec<String>,
    },
    Submit { name: String, value: String },
}

impl Control {
    fn name(&self) -> &str {
        match self {
            Control::Field { name, .. }
            | Control::Toggle { name, .. }
            | Control::Select { name, .. }
            | Control::Submit { name, .. } => name,
        }
    }
}

/// A form taken from a page, ready to be filled in and submitted
#[derive(Debug, Clone)]
pub(crate) struct Form {
    pub name: String,
    pub method: Method,
    pub action: Url,
    controls: Vec<Control>,
}

impl Form {
    /// Locate a form by its `name` (or `id`) attribute on a page
    pub fn find(html: &str, page_url: &Url, form_name: &str) -> Option<Form> {
        let document = Html::parse_document(html);
        let form_selector = Selector::parse("form").ok()?;

        let element = document.select(&form_selector).find(|form| {
            let attrs = form.value();
            attrs.attr("name") == Some(form_name) || attrs.attr("id") == Some(form_name)
        })?;

        let method = match element.value().attr("method") {
            Some(m) if m.eq_ignore_ascii_case("post") => Method::POST,
            _ => Method::GET,
        };
        let action = match element.value().attr("action").map(str::trim) {
            Some(action) if !action.is_empty() => page_url.join(action).ok()?,
            _ => page_url.clone(),
        };

        Some(Form {
            name: form_name.to_string(),
            method,
            action,
            controls: collect_controls(element),
        })
    }

    fn has_control(&self, name: &str) -> bool {
        self.controls.iter().any(|c| c.name() == name)
    }

    /// Overwrite the value of a text-like control
    ///
    /// Returns `false` when the form has no such control.
    pub fn set_text(&mut self, name: &str, new_value: &str) -> bool {
        let mut found = false;
        for control in &mut self.controls {
            if let Control::Field { name: n, value } = control
                && n == name
            {
                *value = new_value.to_string();
                found = true;
            }
        }
        found
    }

    /// Pick `choice` for a list control (radio group, select or plain field)
    ///
    /// Returns `false` when no control named `name` offers that choice.
    pub fn set_choice(&mut self, name: &str, choice: &str) -> bool {
        let offers_choice = self.controls.iter().any(|c| match c {
            Control::Toggle { name: n, value, .. } => n == name && value == choice,
            Control::Select { name: n, options, .. } => {
                n == name && options.iter().any(|o| o == choice)
            }
            Control::Field { name: n, .. } => n == name,
            Control::Submit { .. } => false,
        });
        if !offers_choice {
            return false;
        }

        for control in &mut self.controls {
            match control {
                Control::Toggle {
                    name: n,
                    value,
                    checked,
                    ..
                } if n == name => *checked = value == choice,
                Control::Select { name: n, selected, .. } if n == name => {
                    *selected = vec![choice.to_string()];
                }
                Control::Field { name: n, value } if n == name => *value = choice.to_string(),
                _ => {}
            }
        }
        true
    }

    /// Mark the first item of the named checkbox (or select) as selected
    ///
    /// Returns `false` when the form has no such control.
    pub fn select(&mut self, name: &str) -> bool {
        let Some(index) = self.controls.iter().position(|c| {
            c.name() == name && matches!(c, Control::Toggle { .. } | Control::Select { .. })
        }) else {
            return false;
        };

        let mut is_radio = false;
        match &mut self.controls[index] {
            Control::Toggle { checked, radio, .. } => {
                *checked = true;
                is_radio = *radio;
            }
            Control::Select {
                options, selected, ..
            } => {
                if let Some(first) = options.first()
                    && !selected.contains(first)
                {
                    selected.push(first.clone());
                }
            }
            Control::Field { .. } | Control::Submit { .. } => {}
        }
        // Other buttons of a radio group are released
        if is_radio {
            self.uncheck_others(name, index);
        }
        true
    }

    fn uncheck_others(&mut self, group: &str, keep: usize) {
        for (i, control) in self.controls.iter_mut().enumerate() {
            if let Control::Toggle {
                name,
                checked,
                radio: true,
                ..
            } = control
                && name == group
                && i != keep
            {
                *checked = false;
            }
        }
    }

    /// Successful controls as name/value pairs, in document order
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut submit_seen = false;
        for control in &self.controls {
            match control {
                Control::Field { name, value } => pairs.push((name.clone(), value.clone())),
                Control::Toggle {
                    name,
                    value,
                    checked: true,
                    ..
                } => pairs.push((name.clone(), value.clone())),
                Control::Toggle { .. } => {}
                Control::Select { name, selected, .. } => {
                    pairs.extend(selected.iter().map(|v| (name.clone(), v.clone())));
                }
                // Only the button that "clicks" the form is sent
                Control::Submit { name, value } if !submit_seen => {
                    submit_seen = true;
                    pairs.push((name.clone(), value.clone()));
                }
                Control::Submit { .. } => {}
            }
        }
        pairs
    }
}

fn collect_controls(form: ElementRef) -> Vec<Control> {
    let Ok(selector) = Selector::parse("input, select, textarea, button") else {
        return Vec::new();
    };
    let option_selector = Selector::parse("option").ok();

    let mut controls = Vec::new();
    for element in form.select(&selector) {
        let attrs = element.value();
        let Some(name) = attrs.attr("name").filter(|n| !n.is_empty()) else {
            continue;
        };
        if attrs.attr("disabled").is_some() {
            continue;
        }
        let name = name.to_string();

        let control = match attrs.name() {
            "select" => {
                let options: Vec<(String, bool)> = option_selector
                    .iter()
                    .flat_map(|sel| element.select(sel))
                    .map(|opt| {
                        let value = opt
                            .value()
                            .attr("value")
                            .map(str::to_string)
                            .unwrap_or_else(|| opt.text().collect::<String>().trim().to_string());
                        (value, opt.value().attr("selected").is_some())
                    })
                    .collect();
                let mut selected: Vec<String> = options
                    .iter()
                    .filter(|(_, sel)| *sel)
                    .map(|(v, _)| v.clone())
                    .collect();
                if selected.is_empty()
                    && attrs.attr("multiple").is_none()
                    && let Some((first, _)) = options.first()
                {
                    selected.push(first.clone());
                }
                Control::Select {
                    name,
                    options: options.into_iter().map(|(v, _)| v).collect(),
                    selected,
                }
            }
            "textarea" => Control::Field {
                name,
                value: element.text().collect(),
            },
            tag => {
                let kind = match tag {
                    "button" => attrs.attr("type").unwrap_or("submit"),
                    _ => attrs.attr("type").unwrap_or("text"),
                }
                .to_ascii_lowercase();
                let value = attrs.attr("value").unwrap_or_default().to_string();
                match kind.as_str() {
                    "checkbox" | "radio" => Control::Toggle {
                        name,
                        value: if value.is_empty() {
                            "on".to_string()
                        } else {
                            value
                        },
                        checked: attrs.attr("checked").is_some(),
                        radio: kind == "radio",
                    },
                    "submit" | "image" => Control::Submit { name, value },
                    "button" | "reset" | "file" => continue,
                    _ => Control::Field { name, value },
                }
            }
        };
        controls.push(control);
    }
    controls
}

/// Fill in the login form with the patron's credentials
pub(crate) fn encode_login(
    mut form: Form,
    userid: &str,
    password: &str,
) -> Result<Form, SirsiError> {
    for field in [USER_ID_FIELD, PASSWORD_FIELD] {
        if !form.has_control(field) {
            return Err(SirsiError::Navigation(format!(
                "login form has no {} field",
                field
            )));
        }
    }
    form.set_text(USER_ID_FIELD, userid);
    form.set_text(PASSWORD_FIELD, password);
    Ok(form)
}

/// Ask the catalog to renew every checked-out item
pub(crate) fn encode_renew_all(mut form: Form) -> Result<Form, SirsiError> {
    if !form.set_choice(SELECTION_TYPE, SELECT_ALL) {
        return Err(SirsiError::Navigation(format!(
            "form {} has no {}={} choice",
            form.name, SELECTION_TYPE, SELECT_ALL
        )));
    }
    Ok(form)
}

/// Select each item's renewal control
///
/// Fails on the first item without a control, leaving nothing submitted.
pub(crate) fn encode_renew_selected(mut form: Form, items: &[Item]) -> Result<Form, SirsiError> {
    for item in items {
        if !form.select(&item.renew_token()) {
            return Err(SirsiError::FormField {
                token: item.token().to_string(),
            });
        }
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://catalog.test/uhtbin/cgisirsi/x/0/57/30").unwrap()
    }

    const RENEW_PAGE: &str = r#"<html><body>
        <form name="renewitems" method="post" action="/uhtbin/renew">
          <input type="hidden" name="user_id" value="">
          <input type="checkbox" name="RENEW^100" id="RENEW^100">
          <input type="checkbox" name="RENEW^200" id="RENEW^200">
          <input type="checkbox" name="RENEW^300" disabled>
          <select name="selection_type">
            <option value="selected">Renew selected</option>
            <option value="all">Renew all</option>
          </select>
          <input type="submit" name="renew" value="Renew">
          <input type="submit" name="cancel" value="Cancel">
        </form></body></html>"#;

    fn renew_form() -> Form {
        Form::find(RENEW_PAGE, &base(), RENEW_FORM).unwrap()
    }

    fn pair(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn test_find_resolves_action_and_method() {
        let form = renew_form();
        assert_eq!(form.method, Method::POST);
        assert_eq!(form.action.as_str(), "http://catalog.test/uhtbin/renew");
    }

    #[test]
    fn test_missing_form() {
        assert!(Form::find(RENEW_PAGE, &base(), LOGIN_FORM).is_none());
    }

    #[test]
    fn test_default_pairs() {
        assert_eq!(
            renew_form().pairs(),
            vec![
                pair("user_id", ""),
                pair("selection_type", "selected"),
                pair("renew", "Renew"),
            ]
        );
    }

    #[test]
    fn test_renew_all_sets_selection_type() {
        let form = encode_renew_all(renew_form()).unwrap();
        assert!(form.pairs().contains(&pair("selection_type", "all")));
        assert!(!form.pairs().contains(&pair("selection_type", "selected")));
    }

    #[test]
    fn test_renew_all_without_selection_type() {
        let html = RENEW_PAGE.replace("selection_type", "mode");
        let form = Form::find(&html, &base(), RENEW_FORM).unwrap();
        assert!(matches!(encode_renew_all(form), Err(SirsiError::Navigation(_))));
    }

    #[test]
    fn test_renew_all_with_radio_group() {
        let html = r#"<form name="renewitems" method="post">
            <input type="radio" name="selection_type" value="selected" checked>
            <input type="radio" name="selection_type" value="all">
        </form>"#;
        let form = Form::find(html, &base(), RENEW_FORM).unwrap();
        let form = encode_renew_all(form).unwrap();
        assert_eq!(form.pairs(), vec![pair("selection_type", "all")]);
        assert_eq!(form.action, base());
    }

    #[test]
    fn test_renew_selected_checks_controls() {
        let items = [Item::new("100", "a"), Item::new("RENEW^200", "b")];
        let form = encode_renew_selected(renew_form(), &items).unwrap();
        let pairs = form.pairs();
        assert!(pairs.contains(&pair("RENEW^100", "on")));
        assert!(pairs.contains(&pair("RENEW^200", "on")));
    }

    #[test]
    fn test_renew_selected_missing_control_names_token() {
        let items = [Item::new("100", "a"), Item::new("999", "b")];
        match encode_renew_selected(renew_form(), &items) {
            Err(SirsiError::FormField { token }) => assert_eq!(token, "999"),
            other => panic!("Expected FormField error, got {:?}", other),
        }
    }

    #[test]
    fn test_disabled_control_cannot_be_selected() {
        let items = [Item::new("300", "c")];
        assert!(matches!(
            encode_renew_selected(renew_form(), &items),
            Err(SirsiError::FormField { .. })
        ));
    }

    #[test]
    fn test_login_encoding() {
        let html = r#"<form name="loginform" method="post" action="login">
            <input type="text" name="user_id">
            <input type="password" name="password">
            <input type="submit" value="Login">
        </form>"#;
        let form = Form::find(html, &base(), LOGIN_FORM).unwrap();
        let form = encode_login(form, "2112", "secret").unwrap();
        assert_eq!(
            form.action.as_str(),
            "http://catalog.test/uhtbin/cgisirsi/x/0/57/login"
        );
        // The unnamed submit button contributes nothing
        assert_eq!(
            form.pairs(),
            vec![pair("user_id", "2112"), pair("password", "secret")]
        );
    }

    #[test]
    fn test_login_form_without_password() {
        let html = r#"<form name="loginform"><input name="user_id"></form>"#;
        let form = Form::find(html, &base(), LOGIN_FORM).unwrap();
        assert!(matches!(
            encode_login(form, "a", "b"),
            Err(SirsiError::Navigation(_))
        ));
    }
}
