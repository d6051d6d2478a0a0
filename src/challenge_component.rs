//! Challenge route for 3-D Secure.
//!
//! Mount [`ThreeDsChallenge`] on the page configured as
//! `CheckoutConfig::challenge_path`. On first load it shows the issuer's
//! challenge; when the issuer sends the shopper back with the outcome in the
//! query string, it settles the attempt and reports it.

use std::rc::Rc;

use yew::prelude::*;

use crate::analytics::Analytics;
use crate::browser::{BrowserNavigator, RudderAnalytics};
use crate::components::{ErrorNotice, OutcomeNotice};
use crate::config::CheckoutConfig;
use crate::controller::SubmissionController;
use crate::error::PaymentError;
use crate::outcome::OutcomeReport;
use crate::three_ds::{ChallengeStep, ThreeDsRedirectHandler};

#[derive(Properties, PartialEq, Clone)]
pub struct ThreeDsChallengeProps {
    pub config: CheckoutConfig,
    #[prop_or_default]
    pub on_outcome: Callback<OutcomeReport>,
}

/// Resume the attempt carried by the current URL.
///
/// The controller has no widget here; it only replays the challenge outcome.
pub fn resume_challenge(
    config: &CheckoutConfig,
    analytics: Rc<dyn Analytics>,
) -> Result<ChallengeStep, PaymentError> {
    let redirect = ThreeDsRedirectHandler::new(config.challenge_path.clone(), Rc::new(BrowserNavigator));
    SubmissionController::new(analytics, redirect).resume_from_navigation()
}

#[function_component(ThreeDsChallenge)]
pub fn three_ds_challenge(props: &ThreeDsChallengeProps) -> Html {
    let step = use_state(|| None::<Result<ChallengeStep, PaymentError>>);

    {
        let step = step.clone();
        let config = props.config.clone();
        let on_outcome = props.on_outcome.clone();
        use_effect_with((), move |_| {
            let resumed = resume_challenge(&config, Rc::new(RudderAnalytics));
            match &resumed {
                Ok(ChallengeStep::Settled(report)) => on_outcome.emit(report.clone()),
                Ok(ChallengeStep::Challenge { attempt_id, .. }) => {
                    log::info!("showing issuer challenge for attempt {}", attempt_id)
                }
                Err(e) => log::error!("challenge page could not resume: {}", e),
            }
            step.set(Some(resumed));
            || ()
        });
    }

    match &*step {
        None => html! { <p class="ysf-loading">{ "Loading…" }</p> },
        Some(Ok(ChallengeStep::Challenge { redirect, .. })) => html! {
            <iframe
                class="ysf-challenge"
                src={redirect.clone()}
                title="3-D Secure challenge"
            />
        },
        Some(Ok(ChallengeStep::Settled(report))) => html! {
            <OutcomeNotice report={report.clone()} />
        },
        Some(Err(e)) => html! { <ErrorNotice message={Some(e.user_message())} /> },
    }
}
