//! Common test utilities: in-process stand-ins for the InfluxDB write API and
//! its Flight SQL query endpoint.
#![allow(dead_code)]

use arrow_array::{Int64Array, RecordBatch, StringArray};
use arrow_flight::{
    encode::FlightDataEncoderBuilder,
    flight_service_server::{FlightService, FlightServiceServer},
    sql::{
        server::FlightSqlService, CommandStatementQuery, ProstMessageExt, SqlInfo,
        TicketStatementQuery,
    },
    FlightDescriptor, FlightEndpoint, FlightInfo, Ticket,
};
use arrow_schema::{DataType, Field, Schema};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use futures::{stream, TryStreamExt};
use influx_census::Settings;
use prost::Message;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tonic::{metadata::MetadataMap, transport::Server, Request, Response, Status};

pub fn test_settings(write_addr: SocketAddr, query_port: u16) -> Settings {
    Settings {
        url: format!("http://127.0.0.1:{}", write_addr.port()),
        query_port,
        organisation: "acme".to_string(),
        bucket: "census-bucket".to_string(),
        token: "test-token".to_string(),
        write_interval_ms: 10,
    }
}

pub fn census_batch(locations: &[&str], counts: &[i64]) -> RecordBatch {
    let schema = Schema::new(vec![
        Field::new("location", DataType::Utf8, false),
        Field::new("ants", DataType::Int64, true),
    ]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(StringArray::from(locations.to_vec())),
            Arc::new(Int64Array::from(counts.to_vec())),
        ],
    )
    .unwrap()
}

/// One request seen by the Flight SQL stand-in.
#[derive(Debug, Clone)]
pub struct SeenCall {
    pub method: &'static str,
    pub authorization: Option<String>,
    pub bucket: Option<String>,
    pub query: Option<String>,
}

#[derive(Clone)]
struct CensusFlightServer {
    batches: Vec<RecordBatch>,
    seen: Arc<Mutex<Vec<SeenCall>>>,
}

impl CensusFlightServer {
    fn record(&self, method: &'static str, metadata: &MetadataMap, query: Option<String>) {
        let header = |key: &str| {
            metadata
                .get(key)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        self.seen.lock().unwrap().push(SeenCall {
            method,
            authorization: header("authorization"),
            bucket: header("bucket-name"),
            query,
        });
    }
}

#[tonic::async_trait]
impl FlightSqlService for CensusFlightServer {
    type FlightService = Self;

    async fn get_flight_info_statement(
        &self,
        query: CommandStatementQuery,
        request: Request<FlightDescriptor>,
    ) -> Result<Response<FlightInfo>, Status> {
        self.record("get_flight_info", request.metadata(), Some(query.query));

        let ticket = TicketStatementQuery {
            statement_handle: b"census".to_vec().into(),
        };
        let info = FlightInfo::new().with_endpoint(FlightEndpoint::new().with_ticket(Ticket {
            ticket: ticket.as_any().encode_to_vec().into(),
        }));
        Ok(Response::new(info))
    }

    async fn do_get_statement(
        &self,
        _ticket: TicketStatementQuery,
        request: Request<Ticket>,
    ) -> Result<Response<<Self as FlightService>::DoGetStream>, Status> {
        self.record("do_get", request.metadata(), None);

        let batches = self.batches.clone();
        let stream = FlightDataEncoderBuilder::new()
            .build(stream::iter(batches.into_iter().map(Ok)))
            .map_err(Status::from);
        Ok(Response::new(Box::pin(stream)))
    }

    async fn register_sql_info(&self, _id: i32, _info: &SqlInfo) {}
}

pub struct FlightHandle {
    pub addr: SocketAddr,
    pub seen: Arc<Mutex<Vec<SeenCall>>>,
}

/// Serve `batches` for any statement query on an ephemeral local port.
pub async fn start_flight_server(batches: Vec<RecordBatch>) -> FlightHandle {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let service = CensusFlightServer {
        batches,
        seen: seen.clone(),
    };
    let incoming = tokio_stream::wrappers::TcpListenerStream::new(listener);

    tokio::spawn(async move {
        Server::builder()
            .add_service(FlightServiceServer::new(service))
            .serve_with_incoming(incoming)
            .await
            .unwrap();
    });

    FlightHandle { addr, seen }
}

/// One request seen by the write API stand-in.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub params: HashMap<String, String>,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct WriteState {
    reject_at: Option<usize>,
    requests: Arc<Mutex<Vec<WriteRequest>>>,
}

async fn write(
    State(state): State<WriteState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let mut requests = state.requests.lock().unwrap();
    let index = requests.len();
    requests.push(WriteRequest {
        params,
        authorization: headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body,
    });

    if state.reject_at == Some(index) {
        (StatusCode::BAD_REQUEST, "unable to parse points".to_string())
    } else {
        (StatusCode::NO_CONTENT, String::new())
    }
}

pub struct WriteHandle {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<WriteRequest>>>,
}

/// Accept line protocol writes, answering 400 to the request at index `reject_at`.
pub async fn start_write_server(reject_at: Option<usize>) -> WriteHandle {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route("/api/v2/write", post(write))
        .with_state(WriteState {
            reject_at,
            requests: requests.clone(),
        });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    WriteHandle { addr, requests }
}
