/// Operation tags every protocol message. The wire strings are fixed by
/// the protocol and shared bit-exactly by all participants.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Operation {
    #[serde(rename = "PUT_REQUEST")]
    PutRequest,
    #[serde(rename = "PUT_RESPONSE")]
    PutResponse,
    #[serde(rename = "PUTP_REQUEST")]
    PutPRequest,
    #[serde(rename = "PUTP_RESPONSE")]
    PutPResponse,
    #[serde(rename = "GET_REQUEST")]
    GetRequest,
    #[serde(rename = "GET_RESPONSE")]
    GetResponse,
    #[serde(rename = "GETP_REQUEST")]
    GetPRequest,
    #[serde(rename = "GETP_RESPONSE")]
    GetPResponse,
    #[serde(rename = "GETALL_REQUEST")]
    GetAllRequest,
    #[serde(rename = "GETALL_RESPONSE")]
    GetAllResponse,
    #[serde(rename = "QUERY_REQUEST")]
    QueryRequest,
    #[serde(rename = "QUERY_RESPONSE")]
    QueryResponse,
    #[serde(rename = "QUERYP_REQUEST")]
    QueryPRequest,
    #[serde(rename = "QUERYP_RESPONSE")]
    QueryPResponse,
    #[serde(rename = "QUERYALL_REQUEST")]
    QueryAllRequest,
    #[serde(rename = "QUERYALL_RESPONSE")]
    QueryAllResponse,
    #[serde(rename = "QUERYAGG_REQUEST")]
    QueryAggRequest,
    #[serde(rename = "QUERYAGG_RESPONSE")]
    QueryAggResponse,
    #[serde(rename = "GETAGG_REQUEST")]
    GetAggRequest,
    #[serde(rename = "GETAGG_RESPONSE")]
    GetAggResponse,
    #[serde(rename = "PUTAGG_REQUEST")]
    PutAggRequest,
    #[serde(rename = "PUTAGG_RESPONSE")]
    PutAggResponse,
    #[serde(rename = "SIZE_REQUEST")]
    SizeRequest,
    #[serde(rename = "SIZE_RESPONSE")]
    SizeResponse,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        use Operation::*;
        match self {
            PutRequest => "PUT_REQUEST",
            PutResponse => "PUT_RESPONSE",
            PutPRequest => "PUTP_REQUEST",
            PutPResponse => "PUTP_RESPONSE",
            GetRequest => "GET_REQUEST",
            GetResponse => "GET_RESPONSE",
            GetPRequest => "GETP_REQUEST",
            GetPResponse => "GETP_RESPONSE",
            GetAllRequest => "GETALL_REQUEST",
            GetAllResponse => "GETALL_RESPONSE",
            QueryRequest => "QUERY_REQUEST",
            QueryResponse => "QUERY_RESPONSE",
            QueryPRequest => "QUERYP_REQUEST",
            QueryPResponse => "QUERYP_RESPONSE",
            QueryAllRequest => "QUERYALL_REQUEST",
            QueryAllResponse => "QUERYALL_RESPONSE",
            QueryAggRequest => "QUERYAGG_REQUEST",
            QueryAggResponse => "QUERYAGG_RESPONSE",
            GetAggRequest => "GETAGG_REQUEST",
            GetAggResponse => "GETAGG_RESPONSE",
            PutAggRequest => "PUTAGG_REQUEST",
            PutAggResponse => "PUTAGG_RESPONSE",
            SizeRequest => "SIZE_REQUEST",
            SizeResponse => "SIZE_RESPONSE",
        }
    }

    /// True for request operations which consume their match from the
    /// space: get, get-agg and put-agg. A parked waiter registered under
    /// one of these claims delivered tuples exclusively.
    pub fn is_consuming(&self) -> bool {
        matches!(
            self,
            Operation::GetRequest | Operation::GetAggRequest | Operation::PutAggRequest
        )
    }
}

impl std::str::FromStr for Operation {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Operation::*;
        Ok(match s {
            "PUT_REQUEST" => PutRequest,
            "PUT_RESPONSE" => PutResponse,
            "PUTP_REQUEST" => PutPRequest,
            "PUTP_RESPONSE" => PutPResponse,
            "GET_REQUEST" => GetRequest,
            "GET_RESPONSE" => GetResponse,
            "GETP_REQUEST" => GetPRequest,
            "GETP_RESPONSE" => GetPResponse,
            "GETALL_REQUEST" => GetAllRequest,
            "GETALL_RESPONSE" => GetAllResponse,
            "QUERY_REQUEST" => QueryRequest,
            "QUERY_RESPONSE" => QueryResponse,
            "QUERYP_REQUEST" => QueryPRequest,
            "QUERYP_RESPONSE" => QueryPResponse,
            "QUERYALL_REQUEST" => QueryAllRequest,
            "QUERYALL_RESPONSE" => QueryAllResponse,
            "QUERYAGG_REQUEST" => QueryAggRequest,
            "QUERYAGG_RESPONSE" => QueryAggResponse,
            "GETAGG_REQUEST" => GetAggRequest,
            "GETAGG_RESPONSE" => GetAggResponse,
            "PUTAGG_REQUEST" => PutAggRequest,
            "PUTAGG_RESPONSE" => PutAggResponse,
            "SIZE_REQUEST" => SizeRequest,
            "SIZE_RESPONSE" => SizeResponse,
            other => return Err(crate::Error::UnsupportedOperation(other.to_string())),
        })
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
