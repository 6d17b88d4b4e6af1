//! Reply fixtures shared by the integration tests.

#![allow(dead_code)]

pub const GET_PARAMETER_VALUES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:soap-enc="http://schemas.xmlsoap.org/soap/encoding/" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:cwmp="urn:dslforum-org:cwmp-1-0">
  <soap:Header>
    <cwmp:ID soap:mustUnderstand="1">1001</cwmp:ID>
  </soap:Header>
  <soap:Body>
    <cwmp:GetParameterValuesResponse>
      <ParameterList soap-enc:arrayType="cwmp:ParameterValueStruct[2]">
        <ParameterValueStruct>
          <Name>Device.DeviceInfo.SoftwareVersion</Name>
          <Value xsi:type="xsd:string">V5R020C10S115</Value>
        </ParameterValueStruct>
        <ParameterValueStruct>
          <Name>Device.DeviceInfo.UpTime</Name>
          <Value xsi:type="xsd:unsignedInt">86400</Value>
        </ParameterValueStruct>
      </ParameterList>
    </cwmp:GetParameterValuesResponse>
  </soap:Body>
</soap:Envelope>"#;

pub const GET_PARAMETER_VALUES_JSON: &str = r#"{
  "Header": {"ID": "1001"},
  "Body": {
    "GetParameterValuesResponse": {
      "ParameterList": {
        "ParameterValueStruct": [
          {"Name": "Device.DeviceInfo.SoftwareVersion", "Value": {"Type": "xsd:string", "Text": "V5R020C10S115"}},
          {"Name": "Device.DeviceInfo.UpTime", "Value": {"Type": "xsd:unsignedInt", "Text": "86400"}}
        ]
      }
    }
  }
}"#;

pub const GET_PARAMETER_NAMES_XML: &str = r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/" xmlns:cwmp="urn:dslforum-org:cwmp-1-0">
  <SOAP-ENV:Body>
    <cwmp:GetParameterNamesResponse>
      <ParameterList>
        <ParameterInfoStruct>
          <Name>Device.WiFi.</Name>
          <Writable>0</Writable>
        </ParameterInfoStruct>
        <ParameterInfoStruct>
          <Name>Device.WiFi.SSID.1.SSID</Name>
          <Writable>1</Writable>
        </ParameterInfoStruct>
      </ParameterList>
    </cwmp:GetParameterNamesResponse>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

pub const GET_PARAMETER_ATTRIBUTES_XML: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:cwmp="urn:dslforum-org:cwmp-1-0">
  <soap:Body>
    <cwmp:GetParameterAttributesResponse>
      <ParameterList>
        <ParameterAttributeStruct>
          <Name>Device.DeviceInfo.SoftwareVersion</Name>
          <Notification>2</Notification>
          <AccessList>
            <string>Subscriber</string>
          </AccessList>
        </ParameterAttributeStruct>
      </ParameterList>
    </cwmp:GetParameterAttributesResponse>
  </soap:Body>
</soap:Envelope>"#;

pub const SET_PARAMETER_VALUES_XML: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:cwmp="urn:dslforum-org:cwmp-1-0">
  <soap:Body>
    <cwmp:SetParameterValuesResponse>
      <Status>1</Status>
    </cwmp:SetParameterValuesResponse>
  </soap:Body>
</soap:Envelope>"#;

pub const ADD_OBJECT_XML: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:cwmp="urn:dslforum-org:cwmp-1-0">
  <soap:Body>
    <cwmp:AddObjectResponse>
      <InstanceNumber>4</InstanceNumber>
      <Status>0</Status>
    </cwmp:AddObjectResponse>
  </soap:Body>
</soap:Envelope>"#;

pub const ADD_OBJECT_JSON: &str =
    r#"{"Body": {"AddObjectResponse": {"InstanceNumber": 4, "Status": 0}}}"#;

pub const GET_PARAMETER_VALUES_REQUEST: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:cwmp="urn:dslforum-org:cwmp-1-0">
  <soap:Body>
    <cwmp:GetParameterValues>
      <ParameterNames><string>Device.DeviceInfo.</string></ParameterNames>
    </cwmp:GetParameterValues>
  </soap:Body>
</soap:Envelope>"#;
