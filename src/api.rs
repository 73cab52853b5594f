//! Remote pledge API.
//!
//! The checkout only needs three mutations from the GraphQL backend:
//! `submitPledge`, `payPledge` and `signIn`. [`PledgeApi`] is the seam the
//! orchestrator calls; [`GraphqlApi`] is the browser implementation that
//! posts the mutations with `gloo-net`.

use gloo_net::http::Request;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use web_sys::RequestCredentials;

use crate::pledge::{PaymentMethod, PledgeDraft};

const SUBMIT_PLEDGE: &str = r#"
mutation submitPledge($total: Int!, $options: [PackageOptionInput!]!, $user: UserInput, $reason: String) {
  submitPledge(pledge: {total: $total, options: $options, user: $user, reason: $reason}) {
    pledgeId
    userId
    emailVerify
  }
}
"#;

const PAY_PLEDGE: &str = r#"
mutation payPledge($pledgeId: ID!, $method: PaymentMethod!, $sourceId: String, $pspPayload: String!) {
  payPledge(pledgePayment: {pledgeId: $pledgeId, method: $method, sourceId: $sourceId, pspPayload: $pspPayload}) {
    pledgeId
    userId
    emailVerify
  }
}
"#;

const SIGN_IN: &str = r#"
mutation signIn($email: String!) {
  signIn(email: $email) {
    phrase
  }
}
"#;

/// Errors produced by the pledge API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport-level failure or undecodable body.
    #[error("network error: {0}")]
    Http(#[from] gloo_net::Error),

    /// The server answered with a non-2xx status.
    #[error("api error: status {status}, body: {body}")]
    Status { status: u16, body: String },

    /// The GraphQL layer rejected the operation.
    #[error("{}", .0.join(", "))]
    GraphQl(Vec<String>),

    /// Neither `data` nor `errors` came back.
    #[error("empty response for {0}")]
    MissingData(&'static str),
}

impl ApiError {
    /// Message shown to the visitor.
    ///
    /// GraphQL errors are written for end users by the backend and are shown
    /// as-is; everything else keeps its technical description.
    pub fn display_message(&self) -> String {
        self.to_string()
    }
}

/// Result of `submitPledge` and `payPledge`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PledgeResponse {
    pub pledge_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// The visitor has to confirm their email address before paying.
    #[serde(default)]
    pub email_verify: Option<bool>,
}

impl PledgeResponse {
    pub fn needs_email_verification(&self) -> bool {
        self.email_verify.unwrap_or(false)
    }
}

/// Variables of `payPledge`.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PayPledgeInput {
    pub pledge_id: String,
    pub method: PaymentMethod,
    pub source_id: Option<String>,
    /// Serialized payment source object.
    pub psp_payload: String,
}

/// Result of `signIn`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SignInResponse {
    /// Words shown in the confirmation email, for the visitor to compare.
    pub phrase: String,
}

/// The three backend mutations the checkout relies on.
#[allow(async_fn_in_trait)]
pub trait PledgeApi {
    async fn submit_pledge(&self, draft: &PledgeDraft) -> Result<PledgeResponse, ApiError>;

    async fn pay_pledge(&self, input: &PayPledgeInput) -> Result<PledgeResponse, ApiError>;

    async fn sign_in(&self, email: &str) -> Result<SignInResponse, ApiError>;
}

#[derive(Serialize)]
struct GraphqlRequest<'a, V: Serialize> {
    query: &'static str,
    #[serde(rename = "operationName")]
    operation_name: &'a str,
    variables: V,
}

#[derive(Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SubmitPledgeData {
    submit_pledge: PledgeResponse,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PayPledgeData {
    pay_pledge: PledgeResponse,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SignInData {
    sign_in: SignInResponse,
}

#[derive(Serialize)]
struct SignInVariables<'a> {
    email: &'a str,
}

/// Unwrap a GraphQL envelope into its data or an [`ApiError`].
fn into_result<T>(response: GraphqlResponse<T>, operation: &'static str) -> Result<T, ApiError> {
    if !response.errors.is_empty() {
        return Err(ApiError::GraphQl(
            response.errors.into_iter().map(|e| e.message).collect(),
        ));
    }
    response.data.ok_or(ApiError::MissingData(operation))
}

/// [`PledgeApi`] over HTTP POST to a GraphQL endpoint.
///
/// Requests carry the session cookie (`credentials: include`), which is how
/// the backend recognizes a signed-in visitor.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphqlApi {
    endpoint: String,
}

impl GraphqlApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    async fn execute<V, T>(
        &self,
        operation: &'static str,
        query: &'static str,
        variables: V,
    ) -> Result<T, ApiError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let body = GraphqlRequest {
            query,
            operation_name: operation,
            variables,
        };
        tracing::debug!(operation, endpoint = %self.endpoint, "graphql request");

        let response = Request::post(&self.endpoint)
            .credentials(RequestCredentials::Include)
            .json(&body)?
            .send()
            .await?;

        // GraphQL servers report operation errors with 200 and an `errors`
        // array, but validation errors may come back as 400 with the same
        // envelope. Only fall back to the raw status if the body is not one.
        let status = response.status();
        let text = response.text().await?;
        match serde_json::from_str::<GraphqlResponse<T>>(&text) {
            Ok(envelope) => into_result(envelope, operation),
            Err(_) if !(200..300).contains(&status) => Err(ApiError::Status { status, body: text }),
            Err(e) => Err(ApiError::Http(gloo_net::Error::SerdeError(e))),
        }
    }
}

impl PledgeApi for GraphqlApi {
    async fn submit_pledge(&self, draft: &PledgeDraft) -> Result<PledgeResponse, ApiError> {
        let data: SubmitPledgeData = self.execute("submitPledge", SUBMIT_PLEDGE, draft).await?;
        Ok(data.submit_pledge)
    }

    async fn pay_pledge(&self, input: &PayPledgeInput) -> Result<PledgeResponse, ApiError> {
        let data: PayPledgeData = self.execute("payPledge", PAY_PLEDGE, input).await?;
        Ok(data.pay_pledge)
    }

    async fn sign_in(&self, email: &str) -> Result<SignInResponse, ApiError> {
        let data: SignInData = self
            .execute("signIn", SIGN_IN, SignInVariables { email })
            .await?;
        Ok(data.sign_in)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pledge::PledgeOption;
    use serde_json::json;

    #[test]
    fn test_submit_variables_match_mutation() {
        let draft = PledgeDraft {
            total: 24000,
            options: vec![PledgeOption {
                amount: 1,
                price: 24000,
                template_id: "P1".into(),
            }],
            reason: None,
            user: None,
        };
        let request = GraphqlRequest {
            query: SUBMIT_PLEDGE,
            operation_name: "submitPledge",
            variables: &draft,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["operationName"], "submitPledge");
        assert_eq!(value["variables"]["total"], 24000);
        assert_eq!(value["variables"]["options"][0]["templateId"], "P1");
        assert!(value["variables"]["user"].is_null());
    }

    #[test]
    fn test_pay_variables_use_graphql_names() {
        let input = PayPledgeInput {
            pledge_id: "pl_1".into(),
            method: PaymentMethod::Stripe,
            source_id: Some("src_1".into()),
            psp_payload: "{}".into(),
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(
            value,
            json!({ "pledgeId": "pl_1", "method": "STRIPE", "sourceId": "src_1", "pspPayload": "{}" })
        );
    }

    #[test]
    fn test_into_result_prefers_errors() {
        let response: GraphqlResponse<SubmitPledgeData> = serde_json::from_value(json!({
            "data": null,
            "errors": [{ "message": "Total zu tief" }, { "message": "Ungültige Option" }],
        }))
        .unwrap();
        let err = into_result(response, "submitPledge").unwrap_err();
        assert_eq!(err.display_message(), "Total zu tief, Ungültige Option");
    }

    #[test]
    fn test_into_result_data() {
        let response: GraphqlResponse<SubmitPledgeData> = serde_json::from_value(json!({
            "data": { "submitPledge": { "pledgeId": "pl_1", "userId": "u_1", "emailVerify": null } },
        }))
        .unwrap();
        let data = into_result(response, "submitPledge").unwrap();
        assert_eq!(data.submit_pledge.pledge_id, "pl_1");
        assert!(!data.submit_pledge.needs_email_verification());
    }

    #[test]
    fn test_missing_data() {
        let response: GraphqlResponse<SignInData> =
            serde_json::from_value(json!({ "data": null })).unwrap();
        assert!(matches!(
            into_result(response, "signIn"),
            Err(ApiError::MissingData("signIn"))
        ));
    }
}
