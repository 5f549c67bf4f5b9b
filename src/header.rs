#![allow(non_upper_case_globals)]

//! HTTP header name constants.
//!
//! Names used by the request builder conveniences and the response accessors.
//! Each header is exposed both as an upper-case and a camel-case constant.

macro_rules! standard_headers {
    (
        $(
            $(#[$docs:meta])*
            ($konst:ident, $upcase:ident, $name:literal);
        )+
    ) => {

        $(
            $(#[$docs])*
            pub const $upcase: &'static str = $name;
        )+

        $(
            $(#[$docs])*
            pub const $konst: &'static str = $name;
        )+
    }
}

standard_headers! {
    /// Advertises which content types the client is able to understand.
    (Accept, ACCEPT, "accept");

    /// Advertises which character set the client is able to understand.
    (AcceptCharset, ACCEPT_CHARSET, "accept-charset");

    /// Advertises which content encoding the client is able to understand.
    ///
    /// Servers answer with the Content-Encoding response header when they
    /// pick one of the offered encodings.
    (AcceptEncoding, ACCEPT_ENCODING, "accept-encoding");

    /// Contains the credentials to authenticate a user agent with a server.
    (Authorization, AUTHORIZATION, "authorization");

    /// Specifies directives for caching mechanisms in both requests and
    /// responses.
    (CacheControl, CACHE_CONTROL, "cache-control");

    /// Describes the part of a multipart body a subpart applies to.
    ///
    /// Within a multipart/form-data body every part opens with a
    /// Content-Disposition line naming the form field and, for file
    /// uploads, the original filename.
    (ContentDisposition, CONTENT_DISPOSITION, "content-disposition");

    /// Indicates what additional encoding was applied to the entity body.
    ///
    /// A gzip value here is what makes a response eligible for transparent
    /// decompression.
    (ContentEncoding, CONTENT_ENCODING, "content-encoding");

    /// Indicates the size of the entity body in octets.
    (ContentLength, CONTENT_LENGTH, "content-length");

    /// Indicates the media type of the resource.
    ///
    /// On requests the builder sets this when a form or multipart body is
    /// started; on responses its charset parameter drives text decoding.
    (ContentType, CONTENT_TYPE, "content-type");

    /// Contains the date and time at which the message was originated.
    (Date, DATE, "date");

    /// Identifier for a specific version of a resource.
    (Etag, ETAG, "etag");

    /// Contains the date/time after which the response is considered stale.
    (Expires, EXPIRES, "expires");

    /// Makes a request conditional on the modification date.
    (IfModifiedSince, IF_MODIFIED_SINCE, "if-modified-since");

    /// Makes a request conditional on the entity tag.
    (IfNoneMatch, IF_NONE_MATCH, "if-none-match");

    /// Contains the date and time when the origin believes the resource was
    /// last modified.
    (LastModified, LAST_MODIFIED, "last-modified");

    /// Indicates the URL to redirect a page to.
    (Location, LOCATION, "location");

    /// Contains the credentials to authenticate a user agent to a proxy
    /// server.
    (ProxyAuthorization, PROXY_AUTHORIZATION, "proxy-authorization");

    /// Contains the address of the page from which the requested URL was
    /// followed.
    (Referer, REFERER, "referer");

    /// Contains information about the software used by the origin server to
    /// handle the request.
    (Server, SERVER, "server");

    /// Contains a string identifying the requesting client's software.
    (UserAgent, USER_AGENT, "user-agent");
}
