//! Help endpoint handler.

use crate::api::response;
use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;

/// Static usage text for the entry points.
const HELP_TEXT: &str = "\
callmesh - synthesize a distributed call topology on demand

GET /help
    This text.

GET /healthz
    Health endpoint: server instance id and liveness.

GET /<task>?<parameters>
    Entry point. Builds a call tree, runs <task> at every node, and returns
    the aggregated result map (server id -> node markers).

    parameters:
        size:     integer in [1, 1000], number of nodes
                  defaults to 1
        topology: fan|chain|tree, shape of the call tree
                  defaults to fan
        time:     milliseconds > 0, duration of the task at each node
                  defaults to 50

    tasks (path segment, may be omitted for no-op):
        /sleep   block until cancelled, no resource usage
        /fail    terminate the TCP connection, send no HTTP response
        /crash   crash the server process
        /cpu     consume ~25% of one core
        /ram     hold and touch ~100 MiB of RAM

    example:
        curl \"http://<host:port>/sleep?topology=tree&size=100&time=200\"
";

/// GET /help
pub fn get_help() -> Response<Full<Bytes>> {
    response::text(HELP_TEXT)
}
