//! A drop-in Yew checkout built on Secure Fields.
//!
//! This component loads the Secure Fields script, mounts the hosted card
//! number and CVV fields, feeds every widget event into a
//! [`SubmissionController`], and emits an [`OutcomeReport`] to your app each
//! time the attempt settles. A 3-D Secure redirect leaves the page; the
//! attempt is finished by [`ThreeDsChallenge`](crate::ThreeDsChallenge) on
//! the challenge route.

use std::cell::RefCell;
use std::rc::Rc;

use yew::prelude::*;

use crate::browser::{BrowserNavigator, RudderAnalytics, SecureFieldsWidget};
use crate::components::{Button, ErrorNotice, OutcomeNotice, TextInput};
use crate::config::CheckoutConfig;
use crate::controller::{SubmissionController, SubmissionState};
use crate::error::{ErrorKind, PaymentError};
use crate::handle::ControllerHandle;
use crate::interop::use_secure_fields_script;
use crate::outcome::OutcomeReport;
use crate::three_ds::ThreeDsRedirectHandler;
use crate::types::{CardField, Cardholder, PaymentStatus, SubmitOptions};
use crate::widget::WidgetAdapter;

/// Properties for [`SecureFieldsCheckout`].
///
/// * `config` – merchant and page configuration.
/// * `cardholder` – optional 3-D Secure cardholder block sent with submit.
/// * `on_outcome` – invoked with the [`OutcomeReport`] whenever the attempt settles.
/// * `button_label` – override the Pay button text (default: `"Pay Now"`).
/// * `children` – extra nodes (e.g. order summary) rendered above the form.
#[derive(Properties, PartialEq, Clone)]
pub struct SecureFieldsCheckoutProps {
    pub config: CheckoutConfig,
    #[prop_or_default]
    pub cardholder: Option<Cardholder>,
    #[prop_or_default]
    pub on_outcome: Callback<OutcomeReport>,
    #[prop_or_default]
    pub button_label: Option<String>,
    #[prop_or_default]
    pub children: Children,
}

/// Build the widget, adapter and controller for this page.
fn mount_checkout(config: &CheckoutConfig) -> Result<(ControllerHandle, Rc<WidgetAdapter>), PaymentError> {
    config.validate()?;

    let widget = Rc::new(SecureFieldsWidget::new()?);
    let adapter = Rc::new(WidgetAdapter::new(widget));
    adapter.initialize(config.merchant_id, &config.fields)?;
    for (field, text) in &config.placeholders {
        adapter.set_placeholder(*field, text);
    }

    let redirect = ThreeDsRedirectHandler::new(config.challenge_path.clone(), Rc::new(BrowserNavigator));
    let controller =
        SubmissionController::new(Rc::new(RudderAnalytics), redirect).with_widget(adapter.clone());
    Ok((ControllerHandle::new(controller), adapter))
}

fn field_label(field: CardField) -> &'static str {
    match field {
        CardField::CardNumber => "card number",
        CardField::Cvv => "CVV",
    }
}

/// Message shown under the form for the controller's current state.
fn status_message(controller: &SubmissionController) -> Option<String> {
    if let Some(err) = controller.reporter().error() {
        return Some(err.user_message());
    }
    if let Some(err) = controller.field_error() {
        return Some(err.message.clone());
    }
    let validation = controller.validation()?;
    if validation.invalid_fields.is_empty() {
        return None;
    }
    let fields: Vec<&str> = validation.invalid_fields.iter().map(|f| field_label(*f)).collect();
    Some(format!("Please check your {}.", fields.join(" and ")))
}

/// Hands each settled report to the `on_outcome` prop once.
#[derive(Clone, Default)]
struct OutcomeEmitter {
    last_emitted: Rc<RefCell<Option<OutcomeReport>>>,
    // replaced on every render so the latest prop is called
    on_outcome: Rc<RefCell<Callback<OutcomeReport>>>,
}

impl OutcomeEmitter {
    fn set_callback(&self, on_outcome: Callback<OutcomeReport>) {
        *self.on_outcome.borrow_mut() = on_outcome;
    }

    fn offer(&self, outcome: &OutcomeReport) {
        if !outcome.is_settled() || self.last_emitted.borrow().as_ref() == Some(outcome) {
            return;
        }
        *self.last_emitted.borrow_mut() = Some(outcome.clone());
        let on_outcome = self.on_outcome.borrow().clone();
        on_outcome.emit(outcome.clone());
    }
}

/// Pushes controller state into the component's hooks.
#[derive(Clone)]
struct ViewSync {
    report: UseStateHandle<OutcomeReport>,
    can_submit: UseStateHandle<bool>,
    message: UseStateHandle<Option<String>>,
    emitter: OutcomeEmitter,
}

impl ViewSync {
    fn refresh(&self, controller: &SubmissionController) {
        let outcome = controller.outcome();
        self.can_submit
            .set(controller.state() == SubmissionState::Ready);
        self.message.set(status_message(controller));
        self.emitter.offer(&outcome);
        self.report.set(outcome);
    }
}

/// Yew function component rendering a complete Secure Fields checkout.
///
/// # Example
///
/// ```rust,ignore
/// use yew::prelude::*;
/// use yew_secure_fields::{CheckoutConfig, OutcomeReport, SecureFieldsCheckout};
///
/// #[function_component(App)]
/// fn app() -> Html {
///     let config = CheckoutConfig::new(1100007006);
///     let on_outcome = Callback::from(|report: OutcomeReport| {
///         log::info!("payment settled: {:?}", report.status);
///     });
///     html! {
///         <SecureFieldsCheckout {config} {on_outcome}>
///             <p>{ "Your order: Awesome T-shirt – CHF 25.00" }</p>
///         </SecureFieldsCheckout>
///     }
/// }
/// ```
#[function_component(SecureFieldsCheckout)]
pub fn secure_fields_checkout(props: &SecureFieldsCheckoutProps) -> Html {
    let script_ready = use_secure_fields_script(&props.config.script_src);
    let mounted = use_mut_ref(|| None::<(ControllerHandle, Rc<WidgetAdapter>)>);
    let emitter = use_mut_ref(OutcomeEmitter::default);
    let emitter = emitter.borrow().clone();
    emitter.set_callback(props.on_outcome.clone());
    let report = use_state(OutcomeReport::default);
    let can_submit = use_state(|| false);
    let message = use_state(|| None::<String>);
    let month = use_state(String::new);
    let year = use_state(String::new);

    let sync = ViewSync {
        report: report.clone(),
        can_submit: can_submit.clone(),
        message: message.clone(),
        emitter,
    };

    // Mount the hosted fields once the script is there
    {
        let mounted = mounted.clone();
        let message = message.clone();
        let config = props.config.clone();
        use_effect_with(script_ready, move |ready| {
            if *ready && mounted.borrow().is_none() {
                match mount_checkout(&config) {
                    Ok((controller, adapter)) => {
                        controller.bind(&adapter, move |c| sync.refresh(c));
                        *mounted.borrow_mut() = Some((controller, adapter));
                    }
                    Err(e) => {
                        log::error!("checkout could not be mounted: {}", e);
                        message.set(Some(e.user_message()));
                    }
                }
            }
            || ()
        });
    }

    // Drop the widget handlers on unmount
    {
        let mounted = mounted.clone();
        use_effect_with((), move |_| {
            move || {
                if let Some((_, adapter)) = mounted.borrow().as_ref() {
                    adapter.teardown();
                }
            }
        });
    }

    let on_pay = {
        let mounted = mounted.clone();
        let month = month.clone();
        let year = year.clone();
        let message = message.clone();
        let usage = props.config.usage.clone();
        let cardholder = props.cardholder.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(controller) = mounted.borrow().as_ref().map(|(c, _)| c.clone()) else {
                return;
            };
            let options = match SubmitOptions::from_form(&month, &year, usage.clone()) {
                Ok(options) => match &cardholder {
                    Some(cardholder) => options.with_cardholder(cardholder.clone()),
                    None => options,
                },
                Err(e) => {
                    message.set(Some(e.user_message()));
                    return;
                }
            };

            if let Err(e) = controller.update(|c| c.submit(options)) {
                if e.kind() != ErrorKind::DuplicateSubmission {
                    message.set(Some(e.user_message()));
                }
            }
        })
    };

    let on_restart = {
        let mounted = mounted.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(controller) = mounted.borrow().as_ref().map(|(c, _)| c.clone()) else {
                return;
            };
            if let Err(e) = controller.update(|c| c.reset()) {
                log::warn!("restart rejected: {}", e);
            }
        })
    };

    let on_month = {
        let month = month.clone();
        Callback::from(move |value: String| month.set(value))
    };
    let on_year = {
        let year = year.clone();
        Callback::from(move |value: String| year.set(value))
    };

    let (label, onclick, disabled) = match report.status {
        PaymentStatus::Processing => ("Processing…".to_string(), on_pay, true),
        PaymentStatus::Pending if report.attempt_id.is_some() => {
            ("Redirecting…".to_string(), on_pay, true)
        }
        PaymentStatus::Failed => ("Start over".to_string(), on_restart, false),
        PaymentStatus::Success => ("New payment".to_string(), on_restart, false),
        PaymentStatus::Pending => (
            props
                .button_label
                .clone()
                .unwrap_or_else(|| "Pay Now".to_string()),
            on_pay,
            !script_ready || !*can_submit,
        ),
    };

    let fields = &props.config.fields;
    html! {
        <div class="ysf-checkout">
            { for props.children.iter() }
            <div class="ysf-field">
                <span class="ysf-label">{ "Card number" }</span>
                <div id={fields.card_number.clone()} class="ysf-hosted-field" />
            </div>
            <div class="ysf-field">
                <span class="ysf-label">{ "CVV" }</span>
                <div id={fields.cvv.clone()} class="ysf-hosted-field" />
            </div>
            <div class="ysf-expiry">
                <TextInput name="expm" value={(*month).clone()} oninput={on_month} placeholder="MM" maxlength={Some(2)} />
                <TextInput name="expy" value={(*year).clone()} oninput={on_year} placeholder="YY" maxlength={Some(4)} />
            </div>
            <Button {label} {onclick} {disabled} />
            if report.status == PaymentStatus::Success {
                <OutcomeNotice report={(*report).clone()} />
            } else {
                <ErrorNotice message={(*message).clone()} />
            }
        </div>
    }
}
