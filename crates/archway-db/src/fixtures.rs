//! A minimal Archivists' Toolkit schema and sample collection for tests.

use diesel::{sql_query, QueryResult, RunQueryDsl, SqliteConnection};

const SCHEMA: &[&str] = &[
    "CREATE TABLE Resources (
        resourceId INTEGER PRIMARY KEY,
        title TEXT,
        dateExpression TEXT,
        dateBegin INTEGER,
        dateEnd INTEGER,
        resourceIdentifier1 TEXT,
        resourceLevel TEXT
    )",
    "CREATE TABLE ResourcesComponents (
        resourceComponentId INTEGER PRIMARY KEY,
        resourceId INTEGER,
        parentResourceComponentId INTEGER,
        title TEXT,
        dateExpression TEXT,
        dateBegin INTEGER,
        dateEnd INTEGER,
        persistentID TEXT,
        resourceLevel TEXT
    )",
    "CREATE TABLE ArchDescriptionInstances (
        archDescriptionInstancesId INTEGER PRIMARY KEY,
        instanceDescriminator TEXT NOT NULL,
        instanceType TEXT NOT NULL,
        resourceId INTEGER,
        resourceComponentId INTEGER
    )",
    "CREATE TABLE DigitalObjects (
        digitalObjectId INTEGER PRIMARY KEY,
        version INTEGER NOT NULL,
        lastUpdated TEXT NOT NULL,
        created TEXT NOT NULL,
        lastUpdatedBy TEXT NOT NULL,
        createdBy TEXT NOT NULL,
        title TEXT NOT NULL,
        dateExpression TEXT,
        dateBegin INTEGER,
        dateEnd INTEGER,
        languageCode TEXT NOT NULL,
        restrictionsApply BOOLEAN NOT NULL,
        eadDaoActuate TEXT NOT NULL,
        eadDaoShow TEXT NOT NULL,
        metsIdentifier TEXT NOT NULL,
        objectType TEXT NOT NULL,
        label TEXT NOT NULL,
        objectOrder INTEGER NOT NULL,
        archDescriptionInstancesId INTEGER NOT NULL,
        repositoryId INTEGER NOT NULL
    )",
    "CREATE TABLE FileVersions (
        fileVersionId INTEGER PRIMARY KEY,
        version INTEGER NOT NULL,
        lastUpdated TEXT NOT NULL,
        created TEXT NOT NULL,
        lastUpdatedBy TEXT NOT NULL,
        createdBy TEXT NOT NULL,
        uri TEXT NOT NULL,
        useStatement TEXT NOT NULL,
        sequenceNumber INTEGER NOT NULL,
        eadDaoActuate TEXT NOT NULL,
        eadDaoShow TEXT NOT NULL,
        digitalObjectId INTEGER NOT NULL
    )",
    "CREATE TABLE ArchDescriptionRepeatingData (
        archDescriptionRepeatingDataId INTEGER PRIMARY KEY,
        descriminator TEXT NOT NULL,
        version INTEGER NOT NULL,
        lastUpdated TEXT NOT NULL,
        created TEXT NOT NULL,
        lastUpdatedBy TEXT NOT NULL,
        createdBy TEXT NOT NULL,
        repeatingDataType TEXT NOT NULL,
        title TEXT NOT NULL,
        sequenceNumber INTEGER NOT NULL,
        resourceId INTEGER,
        resourceComponentId INTEGER,
        digitalObjectId INTEGER,
        noteContent TEXT,
        notesEtcTypeId INTEGER
    )",
    "CREATE TABLE Repositories (
        repositoryId INTEGER PRIMARY KEY
    )",
];

/// One collection with two children and two grandchildren, plus two
/// identifier-only collections.
const SAMPLE: &[&str] = &[
    "INSERT INTO Repositories (repositoryId) VALUES (1)",
    "INSERT INTO Resources VALUES (31, 'Parent', '1880 to 1889', 1880, 1889, 'PR01', 'collection')",
    "INSERT INTO Resources VALUES (40, 'Fonds One', NULL, 1900, NULL, 'F1', 'collection')",
    "INSERT INTO Resources VALUES (41, 'Fonds Two', NULL, NULL, NULL, 'F2', 'collection')",
    "INSERT INTO ResourcesComponents VALUES (23, 31, NULL, 'Child A', '1880 to 1888', 1880, 1888, 'CH01', 'subseries')",
    "INSERT INTO ResourcesComponents VALUES (26, 31, NULL, 'Child B', NULL, 1889, NULL, 'CH02', 'file')",
    "INSERT INTO ResourcesComponents VALUES (24, NULL, 23, 'Grandchild A', '1880 to 1888', 1880, 1888, 'GR01', 'item')",
    "INSERT INTO ResourcesComponents VALUES (25, NULL, 23, 'Grandchild B', NULL, NULL, NULL, 'GR02', 'item')",
    "INSERT INTO ArchDescriptionRepeatingData
        (archDescriptionRepeatingDataId, descriminator, version, lastUpdated, created,
         lastUpdatedBy, createdBy, repeatingDataType, title, sequenceNumber, resourceId,
         noteContent, notesEtcTypeId)
     VALUES (1, 'note', 0, '', '', 'admin', 'admin', 'Note', '', 0, 31, 'This is a note', NULL)",
];

pub fn create_schema(conn: &mut SqliteConnection) -> QueryResult<()> {
    for statement in SCHEMA {
        sql_query(*statement).execute(conn)?;
    }
    Ok(())
}

pub fn seed_collection(conn: &mut SqliteConnection) -> QueryResult<()> {
    for statement in SAMPLE {
        sql_query(*statement).execute(conn)?;
    }
    Ok(())
}
